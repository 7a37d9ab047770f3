//! Check contracts - the periodic collection units driven by the scheduler
//!
//! Two capability sets exist: a basic check (`Check`) and a check that can
//! produce standard and real-time output in one pass (`CheckWithRealTime`).
//! The capability is fixed at registration through [`RegisteredCheck`].

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use crate::{BoxedMessage, ContractError};

/// Host context handed to every check on `init`
#[derive(Debug, Clone, Default)]
pub struct SystemInfo {
    pub hostname: String,
    pub cpu_count: usize,
    pub agent_version: String,
}

/// Process-wide group id source
///
/// Cloning shares the same counter. The counter is 32 bits and wraps.
#[derive(Debug, Clone)]
pub struct GroupIdGenerator {
    next: Arc<AtomicI32>,
}

impl GroupIdGenerator {
    /// Create a generator whose first issued id is `seed + 1`
    pub fn new(seed: i32) -> Self {
        Self {
            next: Arc::new(AtomicI32::new(seed)),
        }
    }

    /// Issue the next group id
    pub fn next_id(&self) -> i32 {
        self.next.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}

/// Which halves a dual-mode run should produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub run_standard: bool,
    pub run_real_time: bool,
}

/// Output of a dual-mode run
#[derive(Debug, Default)]
pub struct RunResult {
    pub standard: Vec<BoxedMessage>,
    pub real_time: Vec<BoxedMessage>,
}

/// Basic check
pub trait Check: Send {
    /// Check name (also selects queue and endpoint)
    fn name(&self) -> &str;

    /// One-time initialization with shared system context
    fn init(&mut self, info: &SystemInfo) -> Result<(), ContractError>;

    /// Run the check once
    fn run(&mut self, group_id: i32) -> Result<Vec<BoxedMessage>, ContractError>;

    /// True when the check itself only runs in real-time mode
    fn real_time(&self) -> bool {
        false
    }

    /// Whether the last output should be kept for introspection
    fn should_save_last_run(&self) -> bool {
        true
    }

    /// Release resources; called exactly once after the scheduler exits
    fn cleanup(&mut self) {}
}

/// Check producing standard and real-time output in a single pass
pub trait CheckWithRealTime: Check {
    /// Name used to route the real-time half
    fn real_time_name(&self) -> &str;

    /// Run the requested halves, sharing collection work between them
    fn run_with_options(
        &mut self,
        group_ids: &GroupIdGenerator,
        options: RunOptions,
    ) -> Result<RunResult, ContractError>;
}

/// A check with its capability resolved once at registration
pub enum RegisteredCheck {
    Basic(Box<dyn Check>),
    WithRealTime(Box<dyn CheckWithRealTime>),
}

impl RegisteredCheck {
    pub fn basic(check: impl Check + 'static) -> Self {
        Self::Basic(Box::new(check))
    }

    pub fn with_real_time(check: impl CheckWithRealTime + 'static) -> Self {
        Self::WithRealTime(Box::new(check))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Basic(c) => c.name(),
            Self::WithRealTime(c) => c.name(),
        }
    }

    /// Real-time variant name, if the check has one
    pub fn real_time_name(&self) -> Option<&str> {
        match self {
            Self::Basic(_) => None,
            Self::WithRealTime(c) => Some(c.real_time_name()),
        }
    }

    pub fn real_time(&self) -> bool {
        match self {
            Self::Basic(c) => c.real_time(),
            Self::WithRealTime(c) => c.real_time(),
        }
    }

    pub fn should_save_last_run(&self) -> bool {
        match self {
            Self::Basic(c) => c.should_save_last_run(),
            Self::WithRealTime(c) => c.should_save_last_run(),
        }
    }

    pub fn init(&mut self, info: &SystemInfo) -> Result<(), ContractError> {
        match self {
            Self::Basic(c) => c.init(info),
            Self::WithRealTime(c) => c.init(info),
        }
    }

    /// Standard single-mode run
    pub fn run(&mut self, group_id: i32) -> Result<Vec<BoxedMessage>, ContractError> {
        match self {
            Self::Basic(c) => c.run(group_id),
            Self::WithRealTime(c) => c.run(group_id),
        }
    }

    /// Dual-mode run
    ///
    /// A basic check only ever produces the standard half.
    pub fn run_with_options(
        &mut self,
        group_ids: &GroupIdGenerator,
        options: RunOptions,
    ) -> Result<RunResult, ContractError> {
        match self {
            Self::WithRealTime(c) => c.run_with_options(group_ids, options),
            Self::Basic(c) if options.run_standard => Ok(RunResult {
                standard: c.run(group_ids.next_id())?,
                real_time: Vec::new(),
            }),
            Self::Basic(_) => Ok(RunResult::default()),
        }
    }

    pub fn cleanup(&mut self) {
        match self {
            Self::Basic(c) => c.cleanup(),
            Self::WithRealTime(c) => c.cleanup(),
        }
    }
}

impl std::fmt::Debug for RegisteredCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Basic(_) => "basic",
            Self::WithRealTime(_) => "with_real_time",
        };
        f.debug_struct("RegisteredCheck")
            .field("name", &self.name())
            .field("kind", &kind)
            .finish()
    }
}
