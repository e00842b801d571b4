//! Key → number-sequence storage with optional expiry.

pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Persistence capability the load-time history is kept in.
///
/// `get` returns `None` for absent keys. Backends that hold raw bytes return
/// `None` for values that do not decode (see [`decode_history`]).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<f64>>>;

    /// `ttl` of `None` stores without expiry.
    async fn set(&self, key: &str, values: &[f64], ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Decodes a stored JSON array. Non-numeric elements are dropped; anything
/// that is not an array decodes to `None`.
pub fn decode_history(raw: &str) -> Option<Vec<f64>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
    Some(items.iter().filter_map(serde_json::Value::as_f64).collect())
}

pub fn encode_history(values: &[f64]) -> String {
    // Non-finite values never reach storage (see `history::sanitize`), so
    // every element serializes as a JSON number.
    serde_json::to_string(values).unwrap_or_else(|_| "[]".into())
}
