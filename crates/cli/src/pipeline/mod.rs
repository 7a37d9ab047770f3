//! Collector pipeline: queues, orchestration, telemetry and run statistics.

mod orchestrator;
mod queues;
mod stats;
mod telemetry;

pub use orchestrator::{Collector, AGENT_VERSION};
pub use queues::{CollectorQueues, QueueLimits};
pub use stats::{CheckSummary, PipelineStats};
pub use telemetry::TelemetryIntervals;
