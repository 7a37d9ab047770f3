//! # Weighted Queue
//!
//! 有界加权队列。
//!
//! 负责：
//! - 同时限制条目数量与累计字节权重
//! - 超限时从队首淘汰最旧条目，生产者永不阻塞
//! - `poll` 异步等待数据，`stop` 之后永久返回 `None`

mod metrics;
mod queue;

pub use contracts::WeightedItem;
pub use crate::metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use queue::WeightedQueue;
