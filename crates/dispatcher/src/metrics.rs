//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Payloads handed to the forwarder
    submitted: AtomicU64,
    /// Payloads skipped by the drop list
    dropped: AtomicU64,
    /// Payloads with no known endpoint
    unroutable: AtomicU64,
    /// Submissions the forwarder rejected
    submit_failures: AtomicU64,
    /// Domain responses with a transport error, bad status or bad body
    domain_errors: AtomicU64,
    /// Collector statuses extracted from responses
    statuses: AtomicU64,
}

impl DispatcherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unroutable(&self) -> u64 {
        self.unroutable.load(Ordering::Relaxed)
    }

    pub fn inc_unroutable(&self) {
        self.unroutable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submit_failures(&self) -> u64 {
        self.submit_failures.load(Ordering::Relaxed)
    }

    pub fn inc_submit_failures(&self) {
        self.submit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn domain_errors(&self) -> u64 {
        self.domain_errors.load(Ordering::Relaxed)
    }

    pub fn inc_domain_errors(&self) {
        self.domain_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn statuses(&self) -> u64 {
        self.statuses.load(Ordering::Relaxed)
    }

    pub fn add_statuses(&self, count: u64) {
        self.statuses.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted(),
            dropped: self.dropped(),
            unroutable: self.unroutable(),
            submit_failures: self.submit_failures(),
            domain_errors: self.domain_errors(),
            statuses: self.statuses(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub dropped: u64,
    pub unroutable: u64,
    pub submit_failures: u64,
    pub domain_errors: u64,
    pub statuses: u64,
}

impl MetricsSnapshot {
    /// Combine snapshots of several dispatchers
    pub fn merge(self, other: Self) -> Self {
        Self {
            submitted: self.submitted + other.submitted,
            dropped: self.dropped + other.dropped,
            unroutable: self.unroutable + other.unroutable,
            submit_failures: self.submit_failures + other.submit_failures,
            domain_errors: self.domain_errors + other.domain_errors,
            statuses: self.statuses + other.statuses,
        }
    }
}
