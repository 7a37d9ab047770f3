//! # Process Agent
//!
//! 采集器编排：检查调度、有界投递队列、实时模式反馈。
//!
//! 二进制入口见 `main.rs`；本库暴露 `Collector` 供集成测试直接驱动。

pub mod error;
pub mod pipeline;

pub use error::{CliError, Result};
pub use pipeline::{Collector, CollectorQueues, PipelineStats, QueueLimits, TelemetryIntervals};
