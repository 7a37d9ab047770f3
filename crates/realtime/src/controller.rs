//! RealTimeController - recomputes real-time mode from backend feedback

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::CollectorStatus;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::state::{saturating_millis, RealTimeState};

/// Interval used at startup and whenever the backend asks for a non-positive one
pub const DEFAULT_REAL_TIME_INTERVAL: Duration = Duration::from_secs(2);

/// Outcome of one status batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealTimeUpdate {
    pub enabled: bool,
    pub enabled_changed: bool,
    pub interval: Duration,
    pub interval_changed: bool,
    pub active_clients: i64,
}

/// Owner of the real-time state
///
/// Interval changes are published through a `watch` channel: every scheduler
/// holds its own receiver, so each one observes the latest interval
/// regardless of how many schedulers are running.
pub struct RealTimeController {
    state: Arc<RealTimeState>,
    /// Authoritative interval; the lock serializes concurrent batches
    interval: Mutex<Duration>,
    interval_tx: watch::Sender<Duration>,
}

impl RealTimeController {
    pub fn new(initial_interval: Duration) -> Self {
        let (interval_tx, _) = watch::channel(initial_interval);
        Self {
            state: Arc::new(RealTimeState::new(initial_interval)),
            interval: Mutex::new(initial_interval),
            interval_tx,
        }
    }

    /// Shared read-only view for schedulers
    pub fn state(&self) -> Arc<RealTimeState> {
        Arc::clone(&self.state)
    }

    /// Interval-update receiver for one scheduler
    ///
    /// The current value is marked as seen; `changed()` fires on the next update.
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.interval_tx.subscribe()
    }

    /// Apply one aggregated batch of status records
    ///
    /// Real-time mode is on iff any domain reports an active client. The new
    /// interval is the largest one requested, or the default when that is
    /// not positive. An interval change is visible to every subscriber when
    /// this returns. An empty batch changes nothing.
    pub fn update(&self, statuses: &[CollectorStatus]) -> RealTimeUpdate {
        let mut current = self.interval.lock().unwrap_or_else(PoisonError::into_inner);

        if statuses.is_empty() {
            return RealTimeUpdate {
                enabled: self.state.is_enabled(),
                enabled_changed: false,
                interval: *current,
                interval_changed: false,
                active_clients: self.state.active_clients(),
            };
        }

        let mut should_enable = false;
        let mut max_interval_secs: i64 = 0;
        let mut active_clients: i64 = 0;
        for status in statuses {
            if status.active_clients > 0 {
                should_enable = true;
                active_clients += i64::from(status.active_clients);
            }
            max_interval_secs = max_interval_secs.max(i64::from(status.interval));
        }

        let was_enabled = self.state.is_enabled();
        if was_enabled && !should_enable {
            info!("Detected 0 clients, disabling real-time mode");
            self.state.set_enabled(false);
        } else if !was_enabled && should_enable {
            info!(
                active_clients,
                "Detected {} active clients, enabling real-time mode", active_clients
            );
            self.state.set_enabled(true);
        }
        self.state.set_active_clients(active_clients);

        let requested = if max_interval_secs <= 0 {
            DEFAULT_REAL_TIME_INTERVAL
        } else {
            Duration::from_secs(max_interval_secs as u64)
        };

        let interval_changed = requested != *current;
        if interval_changed {
            *current = requested;
            self.state.set_interval(requested);
            self.interval_tx.send_replace(requested);
            info!(
                interval_ms = saturating_millis(requested),
                schedulers = self.interval_tx.receiver_count(),
                "Real-time interval updated to {:?}",
                requested
            );
        } else {
            debug!(interval_ms = saturating_millis(requested), "Real-time interval unchanged");
        }

        observability::record_real_time_state(should_enable, requested, active_clients);

        RealTimeUpdate {
            enabled: should_enable,
            enabled_changed: was_enabled != should_enable,
            interval: requested,
            interval_changed,
            active_clients,
        }
    }
}

impl Default for RealTimeController {
    fn default() -> Self {
        Self::new(DEFAULT_REAL_TIME_INTERVAL)
    }
}
