//! # Check Scheduler
//!
//! 每个检查一个独立的 tokio 任务：按间隔运行检查，把输出编码成
//! `CheckResult` 推入加权队列，并响应实时间隔变更与停机信号。
//!
//! - 基础检查：启动时先运行一次，然后按固定间隔运行
//! - 仅实时检查：只在实时模式开启时运行，间隔随控制器更新
//! - 双模式检查：按实时间隔触发，每 `standard / real_time` 次附带一次标准运行
//!
//! 检查本身在阻塞线程池上执行，调度器退出时把检查交还给调用方，
//! 由调用方在所有任务结束后统一 `cleanup`。

mod error;
mod last_run;
mod results;
mod run_counter;
mod runner;

pub use error::SchedulerError;
pub use last_run::{LastRun, LastRunStore};
pub use results::{PayloadSettings, ResultBuilder};
pub use run_counter::{log_check_duration, should_log_run, RunCounter};
pub use runner::{CheckScheduler, SchedulerContext, SchedulerExit};
