use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

use super::{decode_history, encode_history, HistoryStore};
use crate::error::Result;

/// Redis-backed history: one JSON array per key, `SET … EX` for expiry.
///
/// `ConnectionManager` is cheaply cloneable and reconnects on failure; every
/// call clones it so `&self` methods stay lock-free.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl HistoryStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<f64>>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        Ok(raw.and_then(|s| {
            let decoded = decode_history(&s);
            if decoded.is_none() {
                warn!(key, "stored load-time history is not a JSON array, ignoring");
            }
            decoded
        }))
    }

    async fn set(&self, key: &str, values: &[f64], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(encode_history(values));
        if let Some(ttl) = ttl {
            // EX rejects 0; sub-second TTLs round up.
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
