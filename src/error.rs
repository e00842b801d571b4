//! Crate-wide error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("config: {0}")]
    Config(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for StatsError {
    fn from(e: redis::RedisError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        // None of these are the client's fault.
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
