//! Delivery queues of the collector

use std::sync::Arc;

use contracts::{
    check_names, AgentConfig, CheckResult, DEFAULT_POD_QUEUE_BYTES, DEFAULT_QUEUE_BYTES,
    DEFAULT_QUEUE_SIZE, DEFAULT_RT_QUEUE_SIZE,
};
use tracing::{info, warn};
use weighted_queue::{QueueMetricsSnapshot, WeightedQueue};

/// Effective queue bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
    pub queue_size: usize,
    pub rt_queue_size: usize,
    pub queue_bytes: u64,
    pub pod_queue_bytes: u64,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE as usize,
            rt_queue_size: DEFAULT_RT_QUEUE_SIZE as usize,
            queue_bytes: DEFAULT_QUEUE_BYTES as u64,
            pod_queue_bytes: DEFAULT_POD_QUEUE_BYTES as u64,
        }
    }
}

impl QueueLimits {
    /// Read limits, replacing non-positive values with defaults
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            queue_size: positive_or("queue_size", config.queue_size, DEFAULT_QUEUE_SIZE) as usize,
            rt_queue_size: positive_or("rt_queue_size", config.rt_queue_size, DEFAULT_RT_QUEUE_SIZE)
                as usize,
            queue_bytes: positive_or(
                "process_queue_bytes",
                config.process_queue_bytes,
                DEFAULT_QUEUE_BYTES,
            ) as u64,
            pod_queue_bytes: positive_or(
                "orchestrator.pod_queue_bytes",
                config.orchestrator.pod_queue_bytes,
                DEFAULT_POD_QUEUE_BYTES,
            ) as u64,
        }
    }
}

fn positive_or(field: &str, value: i64, default: i64) -> i64 {
    if value > 0 {
        return value;
    }
    warn!(field, value, default, "Invalid queue limit, using default");
    default
}

/// The five result queues
pub struct CollectorQueues {
    pub process: Arc<WeightedQueue<CheckResult>>,
    pub rt_process: Arc<WeightedQueue<CheckResult>>,
    pub connections: Arc<WeightedQueue<CheckResult>>,
    pub pod: Arc<WeightedQueue<CheckResult>>,
    pub events: Arc<WeightedQueue<CheckResult>>,
}

impl CollectorQueues {
    pub fn new(limits: QueueLimits) -> Self {
        let queue = |name: &str, size: usize, bytes: u64| Arc::new(WeightedQueue::new(name, size, bytes));
        Self {
            process: queue("process", limits.queue_size, limits.queue_bytes),
            rt_process: queue("rtprocess", limits.rt_queue_size, limits.queue_bytes),
            connections: queue("connections", limits.queue_size, limits.queue_bytes),
            pod: queue("pod", limits.queue_size, limits.pod_queue_bytes),
            events: queue("events", limits.queue_size, limits.queue_bytes),
        }
    }

    /// Queue receiving results of check `name`
    pub fn for_check(&self, name: &str) -> Arc<WeightedQueue<CheckResult>> {
        let queue = match name {
            check_names::POD => &self.pod,
            check_names::RT_PROCESS | check_names::RT_CONTAINER => &self.rt_process,
            check_names::CONNECTIONS => &self.connections,
            check_names::PROCESS_EVENTS => &self.events,
            _ => &self.process,
        };
        Arc::clone(queue)
    }

    pub fn all(&self) -> [&Arc<WeightedQueue<CheckResult>>; 5] {
        [
            &self.process,
            &self.rt_process,
            &self.connections,
            &self.pod,
            &self.events,
        ]
    }

    /// Stop every queue; blocked pollers return `None`
    pub fn stop_all(&self) {
        for queue in self.all() {
            queue.stop();
        }
    }

    /// Publish size/weight gauges
    pub fn record_stats(&self) {
        for queue in self.all() {
            observability::record_queue_stats(queue.name(), queue.len(), queue.weight());
        }
    }

    /// One summary line; nothing when every queue is empty
    pub fn log_sizes(&self) -> bool {
        if self.all().iter().all(|q| q.is_empty()) {
            return false;
        }
        let summary = self
            .all()
            .iter()
            .map(|q| format!("{}[size={}, weight={}]", q.name(), q.len(), q.weight()))
            .collect::<Vec<_>>()
            .join(", ");
        info!("Delivery queues: {}", summary);
        true
    }

    pub fn metrics(&self) -> Vec<(String, QueueMetricsSnapshot)> {
        self.all()
            .iter()
            .map(|q| (q.name().to_string(), q.metrics().snapshot()))
            .collect()
    }
}
