use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::{page_stats, timing};
use crate::AppState;

/// Builds the full Axum `Router`: pages, stats API, static assets, and the
/// instrumentation layers.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        // ── Pages ───────────────────────────────────────────────
        .route("/", get(handlers::pages::home))
        .route("/admin", get(handlers::pages::admin_dashboard))
        // ── Stats API ───────────────────────────────────────────
        .route("/api/stats", get(handlers::stats::get_stats))
        // ── Stylesheet ──────────────────────────────────────────
        .nest_service("/static", ServeDir::new(static_dir))
        // ── Page pipeline wraps every route above ───────────────
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            page_stats::page_stats_middleware,
        ))
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
