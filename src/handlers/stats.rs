use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::history::{Context, Summary};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub generated_at: String,
    pub sample_rate: u8,
    pub front_end: Summary,
    pub admin: Summary,
}

// ─── GET /api/stats ──────────────────────────────────────────────
/// Stored averages for both contexts. Reading this never records a run.

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        generated_at: chrono::Utc::now().to_rfc3339(),
        sample_rate: state.config.sample_rate.percent(),
        front_end: state.history.summary(Context::FrontEnd).await,
        admin: state.history.summary(Context::Admin).await,
    })
}
