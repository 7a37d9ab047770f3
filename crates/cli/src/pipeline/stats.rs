//! Pipeline statistics and metrics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dispatcher::MetricsSnapshot;
use observability::CheckRunStats;
use weighted_queue::QueueMetricsSnapshot;

/// Per-check totals
#[derive(Debug, Clone, Default)]
pub struct CheckSummary {
    pub name: String,
    pub stats: CheckRunStats,
}

/// Statistics from a collector run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// One entry per scheduled check
    pub checks: Vec<CheckSummary>,

    /// Dispatch counters summed over every queue
    pub dispatch: MetricsSnapshot,

    /// Counters of each result queue
    pub queues: Vec<(String, QueueMetricsSnapshot)>,

    /// Real-time mode at shutdown
    pub real_time_enabled: bool,

    /// Real-time interval at shutdown
    pub real_time_interval: Duration,

    /// Start of the most recent check run
    pub last_collect: Option<DateTime<Utc>>,
}

impl PipelineStats {
    pub fn total_runs(&self) -> u64 {
        self.checks.iter().map(|c| c.stats.runs).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.checks.iter().map(|c| c.stats.failures).sum()
    }

    pub fn results_queued(&self) -> u64 {
        self.checks.iter().map(|c| c.stats.results_queued).sum()
    }

    /// Results evicted to honor queue bounds
    pub fn evicted(&self) -> u64 {
        self.queues.iter().map(|(_, q)| q.evicted).sum()
    }

    /// Results discarded at shutdown or after stop
    pub fn discarded(&self) -> u64 {
        self.queues.iter().map(|(_, q)| q.discarded).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Collector Statistics ===\n");

        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Check runs: {} ({} failed)", self.total_runs(), self.total_failures());
        println!("  Results queued: {}", self.results_queued());
        println!(
            "  Payloads submitted: {} (dropped {}, unroutable {}, failed {})",
            self.dispatch.submitted,
            self.dispatch.dropped,
            self.dispatch.unroutable,
            self.dispatch.submit_failures
        );
        println!("  Domain errors: {}", self.dispatch.domain_errors);
        println!(
            "  Real-time: {} (interval {:?})",
            if self.real_time_enabled { "enabled" } else { "disabled" },
            self.real_time_interval
        );
        if let Some(at) = self.last_collect {
            println!("  Last collection: {}", at.to_rfc3339());
        }

        println!("\nChecks");
        for check in &self.checks {
            println!(
                "  - {}: runs={} failures={} queued={} duration_ms: {}",
                check.name,
                check.stats.runs,
                check.stats.failures,
                check.stats.results_queued,
                check.stats.summary()
            );
        }

        println!("\nQueues");
        for (name, q) in &self.queues {
            println!(
                "  - {}: added={} evicted={} discarded={}",
                name, q.added, q.evicted, q.discarded
            );
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut a = CheckRunStats::new();
        a.record_success(Duration::from_millis(5));
        a.record_queued();
        let mut b = CheckRunStats::new();
        b.record_failure();

        let stats = PipelineStats {
            checks: vec![
                CheckSummary {
                    name: "process".into(),
                    stats: a,
                },
                CheckSummary {
                    name: "connections".into(),
                    stats: b,
                },
            ],
            queues: vec![
                (
                    "process".into(),
                    QueueMetricsSnapshot {
                        added: 4,
                        evicted: 1,
                        discarded: 2,
                    },
                ),
                (
                    "pod".into(),
                    QueueMetricsSnapshot {
                        added: 1,
                        evicted: 2,
                        discarded: 0,
                    },
                ),
            ],
            ..Default::default()
        };

        assert_eq!(stats.total_runs(), 1);
        assert_eq!(stats.total_failures(), 1);
        assert_eq!(stats.results_queued(), 1);
        assert_eq!(stats.evicted(), 3);
        assert_eq!(stats.discarded(), 2);
    }
}
