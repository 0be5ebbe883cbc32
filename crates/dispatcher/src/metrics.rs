//! Receiver metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single receiver
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    /// Total accepted sources
    received_count: AtomicU64,
    /// Total rejected sources
    failure_count: AtomicU64,
}

impl ReceiverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received_count(&self) -> u64 {
        self.received_count.load(Ordering::Relaxed)
    }

    pub fn inc_received_count(&self) {
        self.received_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received_count: self.received_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of receiver metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub received_count: u64,
    pub failure_count: u64,
}
