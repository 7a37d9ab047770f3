//! 合成的基础检查与双模式检查

use contracts::{
    BoxedMessage, Check, CheckSpec, CheckWithRealTime, ContractError, GroupIdGenerator, RunOptions,
    RunResult, SystemInfo,
};
use tracing::{debug, trace};

use crate::SyntheticMessage;

/// 实时消息大小
const REAL_TIME_MESSAGE_BYTES: usize = 128;

/// 共享的生成逻辑
#[derive(Debug)]
struct Generator {
    spec: CheckSpec,
    hostname: String,
    runs: u64,
}

impl Generator {
    fn new(spec: CheckSpec) -> Self {
        Self {
            spec,
            hostname: String::new(),
            runs: 0,
        }
    }

    fn init(&mut self, info: &SystemInfo) {
        self.hostname = info.hostname.clone();
        debug!(check = %self.spec.name, hostname = %self.hostname, "Synthetic check initialized");
    }

    /// 推进运行计数，按 `fail_every` 返回错误
    fn advance(&mut self) -> Result<(), ContractError> {
        self.runs += 1;
        let every = u64::from(self.spec.fail_every);
        if every > 0 && self.runs % every == 0 {
            return Err(ContractError::check_run(
                &self.spec.name,
                format!("synthetic failure on run {}", self.runs),
            ));
        }
        Ok(())
    }

    fn messages(&self, group_id: i32, count: usize, size: usize) -> Vec<BoxedMessage> {
        (0..count)
            .map(|_| {
                let mut message = SyntheticMessage::new(group_id, size);
                message.containers = self.spec.containers;
                message.processes = 1;
                Box::new(message) as BoxedMessage
            })
            .collect()
    }
}

/// 基础合成检查
#[derive(Debug)]
pub struct SyntheticCheck {
    inner: Generator,
    real_time: bool,
}

impl SyntheticCheck {
    pub fn new(spec: CheckSpec) -> Self {
        Self {
            inner: Generator::new(spec),
            real_time: false,
        }
    }

    /// 仅在实时模式下运行的检查
    pub fn real_time_only(spec: CheckSpec) -> Self {
        Self {
            inner: Generator::new(spec),
            real_time: true,
        }
    }
}

impl Check for SyntheticCheck {
    fn name(&self) -> &str {
        &self.inner.spec.name
    }

    fn init(&mut self, info: &SystemInfo) -> Result<(), ContractError> {
        self.inner.init(info);
        Ok(())
    }

    fn run(&mut self, group_id: i32) -> Result<Vec<BoxedMessage>, ContractError> {
        self.inner.advance()?;
        let size = if self.real_time {
            REAL_TIME_MESSAGE_BYTES
        } else {
            self.inner.spec.message_bytes
        };
        trace!(check = %self.inner.spec.name, group_id, "Synthetic run");
        Ok(self.inner.messages(group_id, self.inner.spec.messages, size))
    }

    fn real_time(&self) -> bool {
        self.real_time
    }
}

/// 双模式合成检查（如 process / rtprocess）
#[derive(Debug)]
pub struct SyntheticRealTimeCheck {
    inner: Generator,
    real_time_name: String,
}

impl SyntheticRealTimeCheck {
    pub fn new(spec: CheckSpec, real_time_name: impl Into<String>) -> Self {
        Self {
            inner: Generator::new(spec),
            real_time_name: real_time_name.into(),
        }
    }
}

impl Check for SyntheticRealTimeCheck {
    fn name(&self) -> &str {
        &self.inner.spec.name
    }

    fn init(&mut self, info: &SystemInfo) -> Result<(), ContractError> {
        self.inner.init(info);
        Ok(())
    }

    fn run(&mut self, group_id: i32) -> Result<Vec<BoxedMessage>, ContractError> {
        self.inner.advance()?;
        Ok(self
            .inner
            .messages(group_id, self.inner.spec.messages, self.inner.spec.message_bytes))
    }
}

impl CheckWithRealTime for SyntheticRealTimeCheck {
    fn real_time_name(&self) -> &str {
        &self.real_time_name
    }

    /// 一次采集，按需拆成两份输出
    fn run_with_options(
        &mut self,
        group_ids: &GroupIdGenerator,
        options: RunOptions,
    ) -> Result<RunResult, ContractError> {
        self.inner.advance()?;
        let mut result = RunResult::default();
        if options.run_standard {
            result.standard = self.inner.messages(
                group_ids.next_id(),
                self.inner.spec.messages,
                self.inner.spec.message_bytes,
            );
        }
        if options.run_real_time {
            result.real_time = self
                .inner
                .messages(group_ids.next_id(), 1, REAL_TIME_MESSAGE_BYTES);
        }
        Ok(result)
    }
}
