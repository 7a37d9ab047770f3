//! Periodic collector telemetry

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::CollectorQueues;

/// Telemetry cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryIntervals {
    pub heartbeat: Duration,
    pub queue_stats: Duration,
    pub queue_log: Duration,
}

impl Default for TelemetryIntervals {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(15),
            queue_stats: Duration::from_secs(10),
            queue_log: Duration::from_secs(60),
        }
    }
}

/// Heartbeat gauge, queue gauges and the queue summary line
pub(crate) fn spawn_telemetry(
    queues: Arc<CollectorQueues>,
    intervals: TelemetryIntervals,
    mut shutdown: watch::Receiver<bool>,
    version: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ticker = |period: Duration| {
            let mut t = interval_at(Instant::now() + period, period);
            t.set_missed_tick_behavior(MissedTickBehavior::Skip);
            t
        };
        let mut heartbeat = ticker(intervals.heartbeat);
        let mut queue_stats = ticker(intervals.queue_stats);
        let mut queue_log = ticker(intervals.queue_log);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        break;
                    }
                }
                _ = heartbeat.tick() => observability::record_heartbeat(&version),
                _ = queue_stats.tick() => queues.record_stats(),
                _ = queue_log.tick() => {
                    queues.log_sizes();
                }
            }
        }
        debug!("Telemetry task exiting");
    })
}
