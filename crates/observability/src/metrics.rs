//! 采集管道指标模块
//!
//! 检查运行、队列深度、投递结果与实时模式状态的指标记录与统计。

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// 记录一次检查运行
pub fn record_check_run(check: &str, duration: Duration, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "process_agent_check_runs_total",
        "check" => check.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            "process_agent_check_duration_ms",
            "check" => check.to_string()
        )
        .record(duration.as_secs_f64() * 1000.0);
    }
}

/// 记录入队的检查结果
pub fn record_result_queued(check: &str, payloads: usize, bytes: u64) {
    counter!("process_agent_results_queued_total", "check" => check.to_string()).increment(1);
    counter!("process_agent_payloads_queued_total", "check" => check.to_string())
        .increment(payloads as u64);
    histogram!("process_agent_result_bytes", "check" => check.to_string()).record(bytes as f64);
}

/// 记录编码失败的消息
pub fn record_encode_failure(check: &str) {
    counter!("process_agent_encode_failures_total", "check" => check.to_string()).increment(1);
}

/// 记录队列深度与权重
pub fn record_queue_stats(queue: &str, len: usize, weight: u64) {
    gauge!("process_agent_queue_size", "queue" => queue.to_string()).set(len as f64);
    gauge!("process_agent_queue_bytes", "queue" => queue.to_string()).set(weight as f64);
}

/// 心跳
pub fn record_heartbeat(version: &str) {
    gauge!("process_agent_running", "version" => version.to_string()).set(1.0);
}

/// 记录载荷投递
///
/// `outcome`: `submitted` / `dropped` / `unroutable` / `failed`
pub fn record_payload_dispatched(check: &str, outcome: &str) {
    counter!(
        "process_agent_payloads_dispatched_total",
        "check" => check.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录单个后端域名的响应
pub fn record_domain_response(endpoint: &str, domain: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "process_agent_domain_responses_total",
        "endpoint" => endpoint.to_string(),
        "domain" => domain.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录实时模式状态
pub fn record_real_time_state(enabled: bool, interval: Duration, active_clients: i64) {
    gauge!("process_agent_realtime_enabled").set(if enabled { 1.0 } else { 0.0 });
    gauge!("process_agent_realtime_interval_seconds").set(interval.as_secs_f64());
    gauge!("process_agent_realtime_active_clients").set(active_clients as f64);
}

/// 单个检查的运行统计
///
/// 由调度器独占，退出时交给编排器汇总。
#[derive(Debug, Clone, Default)]
pub struct CheckRunStats {
    /// 成功运行次数
    pub runs: u64,

    /// 失败次数
    pub failures: u64,

    /// 入队结果数
    pub results_queued: u64,

    /// 运行耗时统计 (毫秒)
    pub duration_ms: RunningStats,
}

impl CheckRunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录成功运行
    pub fn record_success(&mut self, duration: Duration) {
        self.runs += 1;
        self.duration_ms.push(duration.as_secs_f64() * 1000.0);
    }

    /// 记录失败运行
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// 记录入队
    pub fn record_queued(&mut self) {
        self.results_queued += 1;
    }

    /// 生成摘要
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(&self.duration_ms)
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
