//! # Dispatcher
//!
//! 结果分发模块。
//!
//! 负责：
//! - 从加权队列消费 `CheckResult`
//! - 按检查名路由到后端端点，经 `Forwarder` 提交
//! - 读取各域名的响应状态，反馈给实时控制器

pub mod dispatcher;
pub mod error;
pub mod forwarders;
pub mod metrics;
pub mod responses;
pub mod routing;

pub use contracts::{CheckResult, Forwarder};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use forwarders::{create_forwarder, ConfiguredForwarder, FileForwarder, LogForwarder};
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use responses::read_response_statuses;
pub use routing::route;
