use axum::{
    extract::State,
    response::Html,
    Extension,
};
use std::sync::Arc;

use crate::history::{Context, Summary};
use crate::metrics::QueryCounter;
use crate::middleware::page_stats::RESET_PARAM;
use crate::AppState;

// ─── GET / ───────────────────────────────────────────────────────

pub async fn home(
    State(state): State<Arc<AppState>>,
    Extension(queries): Extension<QueryCounter>,
) -> Html<String> {
    queries.increment();
    let summary = state.history.summary(Context::FrontEnd).await;

    Html(layout(
        "Home",
        &format!(
            "<h1>Welcome</h1>\n<p>This page has {} recorded load times.</p>\n",
            summary.runs
        ),
    ))
}

// ─── GET /admin ──────────────────────────────────────────────────

pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(queries): Extension<QueryCounter>,
) -> Html<String> {
    let mut rows = String::new();
    for context in Context::ALL {
        queries.increment();
        let summary = state.history.summary(context).await;
        rows.push_str(&summary_row(context, summary));
    }

    Html(layout(
        "Dashboard",
        &format!(
            "<h1>Page load stats</h1>\n<table>\n<tr><th>Context</th><th>Runs</th><th>Average</th></tr>\n{rows}</table>\n\
             <p><a href=\"/admin?{RESET_PARAM}=1\">Reset admin averages</a></p>\n"
        ),
    ))
}

fn summary_row(context: Context, summary: Summary) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}s</td></tr>\n",
        context.as_str(),
        summary.runs,
        summary.average_load_secs
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}
