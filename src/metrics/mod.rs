pub mod collector;
pub mod memory;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub use collector::MetricsSnapshot;
pub use memory::MemoryUsage;

/// Storage queries issued while building one page.
///
/// The page pipeline puts a fresh counter in the request extensions;
/// handlers pull it out with `Extension<QueryCounter>` and bump it per query.
#[derive(Debug, Clone, Default)]
pub struct QueryCounter(Arc<AtomicU32>);

impl QueryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}
