//! Markup injected into instrumented pages.

use crate::metrics::MetricsSnapshot;

/// Everything the footer shows for one page view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStats {
    pub snapshot: MetricsSnapshot,
    pub average_load_secs: f64,
    pub runs: usize,
}

pub const STYLESHEET_PATH: &str = "/static/page-load-stats.css";

/// Client-side navigation timing, appended to the stats line once the
/// browser's `load` event has settled.
const CLIENT_TIMING_SCRIPT: &str = r#"<script>
window.addEventListener('load', function () {
  setTimeout(function () {
    var t = window.performance.timing;
    var perf = document.getElementById('page-load-stats');
    if (!perf) { return; }
    var s = function (ms) { return (ms / 1000) + 's'; };
    perf.innerHTML +=
      "<span class='pls-value' title='Total perceived load time for the user'>Total load: " + s(t.loadEventEnd - t.navigationStart) + " | </span>" +
      "<span class='pls-value' title='Time to request'>Request: " + s(t.responseEnd - t.requestStart) + " | </span>" +
      "<span class='pls-value' title='Time for client to load this page after response from server'>Page load: " + s(t.loadEventEnd - t.responseEnd) + " | </span>" +
      "<span class='pls-value' title='How long it took for server to fetch data'>Network: " + s(t.responseEnd - t.fetchStart) + " | </span>" +
      "<span class='pls-value' title='How long it took for connection to server to be created'>Connection: " + s(t.connectEnd - t.connectStart) + "</span>";
  }, 0);
}, false);
</script>"#;

pub fn head_markup() -> String {
    format!("<link rel=\"stylesheet\" href=\"{STYLESHEET_PATH}\">\n{CLIENT_TIMING_SCRIPT}\n")
}

/// The footer container is always emitted so the client script has a
/// target; server figures are filled in only when `stats` is given.
pub fn footer_markup(stats: Option<&PageStats>) -> String {
    let mut out = String::from("<div id=\"page-load-stats-container\">\n<p id=\"page-load-stats\">\n");
    if let Some(s) = stats {
        let snap = &s.snapshot;
        out.push_str(&format!(
            "<span class=\"pls-value\">{} queries in {}s | </span>\n",
            snap.query_count, snap.elapsed_secs
        ));
        out.push_str(&format!(
            "<span class=\"pls-value\">Average load: {}s ({} runs) | </span>\n",
            s.average_load_secs, s.runs
        ));
        out.push_str(&format!(
            "<span class=\"pls-value\">{}/{} MB ({}%) memory used | </span>\n",
            snap.memory_usage_mb, snap.memory_limit_mb, snap.memory_percentile
        ));
        out.push_str(&format!(
            "<span class=\"pls-value\">Peak memory usage {} MB | </span>\n<br />\n",
            snap.memory_peak_mb
        ));
    }
    out.push_str("</p>\n</div>\n");
    out
}

/// Puts `head` before `</head>` and `footer` before `</body>`. Missing
/// anchors degrade to prepend / append.
pub fn inject(html: &str, head: &str, footer: &str) -> String {
    let mut out = String::with_capacity(html.len() + head.len() + footer.len());

    let (before_body_end, tail) = match find_ci(html, "</body>") {
        Some(i) => html.split_at(i),
        None => (html, ""),
    };

    match find_ci(before_body_end, "</head>") {
        Some(i) => {
            out.push_str(&before_body_end[..i]);
            out.push_str(head);
            out.push_str(&before_body_end[i..]);
        }
        None => {
            out.push_str(head);
            out.push_str(before_body_end);
        }
    }
    out.push_str(footer);
    out.push_str(tail);
    out
}

/// ASCII case-insensitive search; returns the byte offset of the last match.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.len() > h.len() {
        return None;
    }
    (0..=h.len() - n.len())
        .rev()
        .find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> PageStats {
        PageStats {
            snapshot: MetricsSnapshot {
                elapsed_secs: 0.042,
                query_count: 2,
                memory_usage_mb: 12.5,
                memory_peak_mb: 14.0,
                memory_limit_mb: 256.0,
                memory_percentile: 5,
            },
            average_load_secs: 0.05,
            runs: 4,
        }
    }

    #[test]
    fn footer_with_stats() {
        let html = footer_markup(Some(&stats()));
        assert!(html.contains("2 queries in 0.042s"));
        assert!(html.contains("Average load: 0.05s (4 runs)"));
        assert!(html.contains("12.5/256 MB (5%) memory used"));
        assert!(html.contains("Peak memory usage 14 MB"));
    }

    #[test]
    fn footer_without_stats_is_an_empty_container() {
        let html = footer_markup(None);
        assert!(html.contains("id=\"page-load-stats\""));
        assert!(!html.contains("queries in"));
    }

    #[test]
    fn inject_at_anchors() {
        let out = inject("<html><HEAD><title>x</title></HEAD><body>hi</BODY></html>", "[H]", "[F]");
        assert_eq!(out, "<html><HEAD><title>x</title>[H]</HEAD><body>hi[F]</BODY></html>");
    }

    #[test]
    fn inject_without_anchors() {
        assert_eq!(inject("<p>bare</p>", "[H]", "[F]"), "[H]<p>bare</p>[F]");
    }
}
