//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Sensor callback counters
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Messages applied to the store
    pub messages_applied: AtomicU64,

    /// Messages rejected (wrong kind, out-of-range id)
    pub messages_rejected: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an applied message
    pub fn record_applied(&self) {
        self.messages_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected message
    pub fn record_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_applied: self.messages_applied.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`IngestionMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_applied: u64,
    pub messages_rejected: u64,
}
