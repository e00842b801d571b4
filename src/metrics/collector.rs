use std::time::Duration;

use serde::Serialize;

use super::memory::MemoryUsage;
use crate::units::{bytes_to_mb, round_to};

/// Per-request measurements shown in the footer. Built once, never stored.
///
/// Memory figures are megabytes rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Server wall time, 3 decimals.
    pub elapsed_secs: f64,
    pub query_count: u32,
    pub memory_usage_mb: f64,
    pub memory_peak_mb: f64,
    pub memory_limit_mb: f64,
    /// `round(usage / limit, 2) * 100`, as a whole percent.
    pub memory_percentile: u32,
}

impl MetricsSnapshot {
    pub fn capture(elapsed: Duration, query_count: u32, memory: MemoryUsage, limit_bytes: u64) -> Self {
        let memory_usage_mb = bytes_to_mb(memory.current_bytes);
        let memory_limit_mb = bytes_to_mb(limit_bytes);

        let memory_percentile = if memory_limit_mb > 0.0 {
            (round_to(memory_usage_mb / memory_limit_mb, 2) * 100.0).round() as u32
        } else {
            0
        };

        Self {
            elapsed_secs: round_to(elapsed.as_secs_f64(), 3),
            query_count,
            memory_usage_mb,
            memory_peak_mb: bytes_to_mb(memory.peak_bytes),
            memory_limit_mb,
            memory_percentile,
        }
    }
}
