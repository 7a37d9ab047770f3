//! 合成消息

use contracts::{ContractError, MessageBody};

/// 固定大小的合成消息体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticMessage {
    /// 所属批次
    pub group_id: i32,
    /// 编码后的字节数
    pub size: usize,
    pub processes: usize,
    pub containers: usize,
    pub manifest: bool,
}

impl SyntheticMessage {
    pub fn new(group_id: i32, size: usize) -> Self {
        Self {
            group_id,
            size,
            processes: 0,
            containers: 0,
            manifest: false,
        }
    }
}

impl MessageBody for SyntheticMessage {
    /// 以 group id 开头，填充到 `size` 字节
    fn encode(&self) -> Result<Vec<u8>, ContractError> {
        let mut body = self.group_id.to_be_bytes().to_vec();
        body.resize(self.size, b'.');
        Ok(body)
    }

    fn container_count(&self) -> usize {
        self.containers
    }

    fn process_count(&self) -> usize {
        self.processes
    }

    fn is_manifest(&self) -> bool {
        self.manifest
    }
}
