//! Page load instrumentation for an axum site.
//!
//! Every HTML page gets its server time, query count and memory figures
//! rendered into the footer for administrators. Load times accumulate into a
//! per-context rolling average in a [`store::HistoryStore`]; a sampled share
//! of requests persist that history and append a line to `load_stats.log`.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod history;
pub mod log_emitter;
pub mod metrics;
pub mod middleware;
pub mod render;
pub mod sampler;
pub mod server;
pub mod store;
pub mod units;

use config::Config;
use history::LoadHistory;
use store::HistoryStore;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Config,

    /// Rolling load-time averages, one history per context.
    pub history: LoadHistory,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn HistoryStore>) -> Self {
        let history = LoadHistory::new(store, config.key_prefix.clone(), config.max_history);
        Self { config, history }
    }
}
