use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::HistoryStore;
use crate::error::Result;

/// In-process store. Used when no Redis URL is configured, and in tests.
///
/// Expired entries are dropped lazily on the next `get`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    values: Vec<f64>,
    expires_at: Option<Instant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<f64>>> {
        let mut map = self.inner.lock();
        let expired = match map.get(key) {
            None => return Ok(None),
            Some(e) => e.expires_at.is_some_and(|t| t <= Instant::now()),
        };
        if expired {
            map.remove(key);
            return Ok(None);
        }
        Ok(map.get(key).map(|e| e.values.clone()))
    }

    async fn set(&self, key: &str, values: &[f64], ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            values: values.to_vec(),
            expires_at: ttl.map(|d| Instant::now() + d),
        };
        self.inner.lock().insert(key.to_owned(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", &[1.0, 2.0], None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![1.0, 2.0]));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_entries_disappear() {
        let store = MemoryStore::new();
        store
            .set("k", &[1.0], Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }
}
