//! Rolling load-time history per rendering context.
//!
//! The read-modify-write in [`LoadHistory::record`] + [`LoadHistory::persist`]
//! is not atomic. Concurrent page views in one context race and the last
//! writer wins; the averages are advisory and that loss is accepted.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::store::HistoryStore;
use crate::units::round_to;

/// Rendering scope; each has its own stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    FrontEnd,
    Admin,
}

impl Context {
    pub const ALL: [Context; 2] = [Context::FrontEnd, Context::Admin];

    /// `/admin` and everything below it is the admin context.
    pub fn from_path(path: &str) -> Self {
        if path == "/admin" || path.starts_with("/admin/") {
            Context::Admin
        } else {
            Context::FrontEnd
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Context::FrontEnd => "front_end",
            Context::Admin => "admin",
        }
    }

    pub fn storage_key(self, prefix: &str) -> String {
        format!("{prefix}{}_load_times", self.as_str())
    }
}

/// Result of [`LoadHistory::record`]: the in-memory sequence including the
/// new observation, and its mean.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub history: Vec<f64>,
    pub average: f64,
}

/// Read-only view of what is currently stored for a context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub runs: usize,
    pub average_load_secs: f64,
}

pub struct LoadHistory {
    store: Arc<dyn HistoryStore>,
    key_prefix: String,
    /// 0 keeps every observation.
    max_history: usize,
}

impl LoadHistory {
    pub fn new(store: Arc<dyn HistoryStore>, key_prefix: impl Into<String>, max_history: usize) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            max_history,
        }
    }

    pub fn key(&self, context: Context) -> String {
        context.storage_key(&self.key_prefix)
    }

    /// Appends `observation` to the stored history and averages the result.
    /// Nothing is written back; see [`persist`](Self::persist).
    pub async fn record(&self, context: Context, observation: f64) -> Recorded {
        let mut history = self.load(context).await;
        history.push(observation);

        if self.max_history > 0 && history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }

        let average = mean(&history);
        Recorded { history, average }
    }

    /// Stores `history` for `context`. A `None` or zero `ttl` never expires.
    pub async fn persist(&self, context: Context, history: &[f64], ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.filter(|d| !d.is_zero());
        self.store.set(&self.key(context), &sanitize(history.to_vec()), ttl).await
    }

    /// Drops the stored history so the context starts cold.
    pub async fn reset(&self, context: Context) -> Result<()> {
        self.store.delete(&self.key(context)).await
    }

    pub async fn summary(&self, context: Context) -> Summary {
        let history = self.load(context).await;
        Summary {
            runs: history.len(),
            average_load_secs: mean(&history),
        }
    }

    /// Stored history, or empty when absent or unreadable.
    async fn load(&self, context: Context) -> Vec<f64> {
        match self.store.get(&self.key(context)).await {
            Ok(Some(values)) => sanitize(values),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(context = context.as_str(), error = %e, "load-time history unreadable, starting empty");
                Vec::new()
            }
        }
    }
}

/// Drops zero, negative and non-finite entries.
fn sanitize(mut values: Vec<f64>) -> Vec<f64> {
    values.retain(|v| v.is_finite() && *v > 0.0);
    values
}

/// Arithmetic mean rounded to 4 decimals; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round_to(values.iter().sum::<f64>() / values.len() as f64, 4)
}
