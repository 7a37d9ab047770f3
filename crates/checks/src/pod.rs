//! 合成 pod 检查

use contracts::{BoxedMessage, Check, CheckSpec, ContractError, SystemInfo};

use crate::SyntheticMessage;

/// 每次运行输出 `messages` 条元数据，随后是同样数量的 manifest
#[derive(Debug)]
pub struct SyntheticPodCheck {
    spec: CheckSpec,
}

impl SyntheticPodCheck {
    pub fn new(spec: CheckSpec) -> Self {
        Self { spec }
    }
}

impl Check for SyntheticPodCheck {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn init(&mut self, _info: &SystemInfo) -> Result<(), ContractError> {
        Ok(())
    }

    fn run(&mut self, group_id: i32) -> Result<Vec<BoxedMessage>, ContractError> {
        let metadata = (0..self.spec.messages).map(|_| SyntheticMessage::new(group_id, self.spec.message_bytes));
        let manifests = (0..self.spec.messages).map(|_| SyntheticMessage {
            manifest: true,
            ..SyntheticMessage::new(group_id, self.spec.message_bytes)
        });
        Ok(metadata
            .chain(manifests)
            .map(|m| Box::new(m) as BoxedMessage)
            .collect())
    }

    fn should_save_last_run(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_then_manifests() {
        let mut spec = CheckSpec::named("pod");
        spec.messages = 2;
        let mut check = SyntheticPodCheck::new(spec);

        let messages = check.run(1).unwrap();
        let flags: Vec<bool> = messages.iter().map(|m| m.is_manifest()).collect();
        assert_eq!(flags, vec![false, false, true, true]);
    }
}
