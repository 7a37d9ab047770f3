//! AgentConfig - Config Loader output
//!
//! Every field carries a serde default so a near-empty file is a valid
//! configuration. Queue limits are kept signed: non-positive values are
//! accepted here and replaced by documented defaults when queues are built.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::check_names;

/// Default standard queue item count
pub const DEFAULT_QUEUE_SIZE: i64 = 256;
/// Default real-time queue item count
pub const DEFAULT_RT_QUEUE_SIZE: i64 = 5;
/// Default byte bound shared by process/rt/connections/events queues
pub const DEFAULT_QUEUE_BYTES: i64 = 60 * 1000 * 1000;
/// Default byte bound of the orchestrator queue
pub const DEFAULT_POD_QUEUE_BYTES: i64 = 15 * 1000 * 1000;
/// Interval used for checks with no configured or built-in interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Top-level agent configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AgentConfig {
    /// Host identity stamped on every payload
    #[serde(default = "default_hostname")]
    #[validate(length(min = 1, message = "hostname must not be empty"))]
    pub hostname: String,

    /// Max items in standard queues
    #[serde(default = "default_queue_size")]
    pub queue_size: i64,

    /// Max items in the real-time queue
    #[serde(default = "default_rt_queue_size")]
    pub rt_queue_size: i64,

    /// Max bytes in process/rt/connections/events queues
    #[serde(default = "default_queue_bytes")]
    pub process_queue_bytes: i64,

    /// Never run real-time checks and ignore backend real-time feedback
    #[serde(default)]
    pub disable_realtime_checks: bool,

    /// Checks whose payloads are produced but never delivered
    #[serde(default)]
    pub drop_check_payloads: Vec<String>,

    /// Per-check interval overrides in seconds
    #[serde(default)]
    pub check_intervals: HashMap<String, u64>,

    #[serde(default)]
    #[validate(nested)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub forwarder: ForwarderConfig,

    /// Enabled checks
    #[serde(default)]
    #[validate(nested)]
    pub checks: Vec<CheckSpec>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            queue_size: default_queue_size(),
            rt_queue_size: default_rt_queue_size(),
            process_queue_bytes: default_queue_bytes(),
            disable_realtime_checks: false,
            drop_check_payloads: Vec::new(),
            check_intervals: HashMap::new(),
            orchestrator: OrchestratorConfig::default(),
            forwarder: ForwarderConfig::default(),
            checks: Vec::new(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Run interval of a check: configured override, then built-in default
    pub fn check_interval(&self, name: &str) -> Duration {
        if let Some(secs) = self.check_intervals.get(name) {
            return Duration::from_secs(*secs);
        }
        builtin_check_interval(name).unwrap_or(DEFAULT_CHECK_INTERVAL)
    }

    /// Real-time checks are enabled unless explicitly disabled
    pub fn run_real_time(&self) -> bool {
        !self.disable_realtime_checks
    }
}

/// Built-in interval for well-known checks
pub fn builtin_check_interval(name: &str) -> Option<Duration> {
    let secs = match name {
        check_names::PROCESS | check_names::CONTAINER | check_names::POD => 10,
        check_names::RT_PROCESS | check_names::RT_CONTAINER => 2,
        check_names::CONNECTIONS => 30,
        check_names::PROCESS_DISCOVERY => 4 * 60 * 60,
        check_names::PROCESS_EVENTS => 10,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_queue_size() -> i64 {
    DEFAULT_QUEUE_SIZE
}

fn default_rt_queue_size() -> i64 {
    DEFAULT_RT_QUEUE_SIZE
}

fn default_queue_bytes() -> i64 {
    DEFAULT_QUEUE_BYTES
}

fn default_pod_queue_bytes() -> i64 {
    DEFAULT_POD_QUEUE_BYTES
}

/// Orchestrator (pod) collection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrchestratorConfig {
    /// Stamp cluster/origin headers on payloads
    #[serde(default)]
    pub collection_enabled: bool,

    /// Ship the manifest half of pod check output
    #[serde(default)]
    pub manifest_collection_enabled: bool,

    /// Max bytes in the orchestrator queue
    #[serde(default = "default_pod_queue_bytes")]
    pub pod_queue_bytes: i64,

    /// Cluster id, resolved outside the agent
    #[serde(default)]
    #[validate(length(min = 1, message = "cluster_id must not be empty when set"))]
    pub cluster_id: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            collection_enabled: false,
            manifest_collection_enabled: false,
            pod_queue_bytes: default_pod_queue_bytes(),
            cluster_id: None,
        }
    }
}

/// Forwarder type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwarderKind {
    /// Log every submission
    #[default]
    Log,
    /// Append submissions to files
    File,
}

/// Forwarder settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwarderConfig {
    #[serde(default)]
    pub kind: ForwarderKind,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// One enabled check
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckSpec {
    #[validate(length(min = 1, message = "check name must not be empty"))]
    pub name: String,

    /// Messages produced per run
    #[serde(default = "default_messages")]
    pub messages: usize,

    /// Encoded size of each message
    #[serde(default = "default_message_bytes")]
    pub message_bytes: usize,

    /// Containers reported per message
    #[serde(default)]
    pub containers: usize,

    /// Fail every Nth run (0 = never)
    #[serde(default)]
    pub fail_every: u32,
}

fn default_messages() -> usize {
    1
}

fn default_message_bytes() -> usize {
    1024
}

impl CheckSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: default_messages(),
            message_bytes: default_message_bytes(),
            containers: 0,
            fail_every: 0,
        }
    }
}

/// Telemetry settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}
