//! # Checks
//!
//! 合成检查实现，用于没有真实主机采集器的环境（演示、集成测试）。
//!
//! - `SyntheticCheck`：基础检查，可配置为仅实时运行或周期性失败
//! - `SyntheticRealTimeCheck`：一次采集同时产出标准与实时输出
//! - `SyntheticPodCheck`：前半为元数据，后半为 manifest
//!
//! `build_checks` 按检查名把配置映射为已注册的检查。

mod message;
mod pod;
mod registry;
mod synthetic;

pub use message::SyntheticMessage;
pub use pod::SyntheticPodCheck;
pub use registry::{build_checks, enabled_check_names};
pub use synthetic::{SyntheticCheck, SyntheticRealTimeCheck};
