//! Queue counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single queue
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Items accepted by `add`
    added: AtomicU64,
    /// Items evicted to make room for newer ones
    evicted: AtomicU64,
    /// Items rejected or discarded because the queue was stopped
    discarded: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&self) -> u64 {
        self.added.load(Ordering::Relaxed)
    }

    pub fn inc_added(&self) {
        self.added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    pub fn add_evicted(&self, count: u64) {
        self.evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn add_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            added: self.added(),
            evicted: self.evicted(),
            discarded: self.discarded(),
        }
    }
}

/// Snapshot of queue counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub added: u64,
    pub evicted: u64,
    pub discarded: u64,
}
