//! Shared real-time state
//!
//! Written only by the controller, read by every scheduler.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct RealTimeState {
    enabled: AtomicBool,
    interval_ms: AtomicU64,
    active_clients: AtomicI64,
}

impl RealTimeState {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            interval_ms: AtomicU64::new(saturating_millis(interval)),
            active_clients: AtomicI64::new(0),
        }
    }

    /// Whether real-time mode is currently on
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Current real-time interval
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Acquire))
    }

    /// Active clients summed over the domains of the last status batch
    pub fn active_clients(&self) -> i64 {
        self.active_clients.load(Ordering::Relaxed)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn set_interval(&self, interval: Duration) {
        self.interval_ms
            .store(saturating_millis(interval), Ordering::Release);
    }

    pub(crate) fn set_active_clients(&self, clients: i64) {
        self.active_clients.store(clients, Ordering::Relaxed);
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
pub(crate) fn saturating_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}
