//! Append-only CSV log of sampled page views.
//!
//! One line per sampled request, no header, no rotation. Concurrent writers
//! rely on `O_APPEND` making each single `write` land whole.

use std::fmt;
use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::metrics::MetricsSnapshot;

/// Fixed 8-field projection of a page view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub elapsed_secs: f64,
    pub query_count: u32,
    pub average_load_secs: f64,
    pub history_len: usize,
    pub memory_usage_mb: f64,
    pub memory_limit_mb: f64,
    pub memory_percentile: u32,
    pub memory_peak_mb: f64,
}

impl LogRecord {
    pub fn new(snapshot: &MetricsSnapshot, average_load_secs: f64, history_len: usize) -> Self {
        Self {
            elapsed_secs: snapshot.elapsed_secs,
            query_count: snapshot.query_count,
            average_load_secs,
            history_len,
            memory_usage_mb: snapshot.memory_usage_mb,
            memory_limit_mb: snapshot.memory_limit_mb,
            memory_percentile: snapshot.memory_percentile,
            memory_peak_mb: snapshot.memory_peak_mb,
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{}",
            self.elapsed_secs,
            self.query_count,
            self.average_load_secs,
            self.history_len,
            self.memory_usage_mb,
            self.memory_limit_mb,
            self.memory_percentile,
            self.memory_peak_mb,
        )
    }
}

/// Appends `record` as one line. Failures are logged and dropped.
pub async fn append(path: &Path, record: &LogRecord) {
    if let Err(e) = try_append(path, record).await {
        debug!(path = %path.display(), error = %e, "load stats log append failed");
    }
}

async fn try_append(path: &Path, record: &LogRecord) -> std::io::Result<()> {
    let line = format!("{record}\n");
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LogRecord {
        LogRecord {
            elapsed_secs: 0.125,
            query_count: 3,
            average_load_secs: 1.5,
            history_len: 3,
            memory_usage_mb: 24.5,
            memory_limit_mb: 256.0,
            memory_percentile: 10,
            memory_peak_mb: 26.75,
        }
    }

    #[test]
    fn eight_fields_in_order() {
        let line = record().to_string();
        assert_eq!(line, "0.125,3,1.5,3,24.5,256,10,26.75");
        assert_eq!(line.split(',').count(), 8);
    }

    #[test]
    fn built_from_snapshot() {
        let snap = MetricsSnapshot {
            elapsed_secs: 2.0,
            query_count: 1,
            memory_usage_mb: 12.0,
            memory_peak_mb: 13.0,
            memory_limit_mb: 128.0,
            memory_percentile: 9,
        };
        assert_eq!(LogRecord::new(&snap, 1.75, 4).to_string(), "2,1,1.75,4,12,128,9,13");
    }

    #[tokio::test]
    async fn appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("load_stats.log");

        append(&path, &record()).await;
        append(&path, &record()).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(contents.ends_with('\n'));
        assert!(lines.iter().all(|l| l.split(',').count() == 8));
    }

    #[tokio::test]
    async fn unwritable_path_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("load_stats.log");

        append(&path, &record()).await;
        assert!(!path.exists());
    }
}
