//! Collector status - backend feedback driving real-time mode

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Response type tag carrying a collector status
pub const COLLECTOR_RESPONSE_TYPE: &str = "collector";

/// Status record reported by one backend domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorStatus {
    /// Number of clients currently watching live data
    #[serde(default)]
    pub active_clients: i32,
    /// Requested real-time interval in seconds
    #[serde(default)]
    pub interval: i32,
}

/// Decoded response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    /// Non-empty when the backend reports an error
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<CollectorStatus>,
}

impl ResponseEnvelope {
    pub fn collector(status: CollectorStatus) -> Self {
        Self {
            kind: COLLECTOR_RESPONSE_TYPE.to_string(),
            message: String::new(),
            status: Some(status),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: COLLECTOR_RESPONSE_TYPE.to_string(),
            message: message.into(),
            status: None,
        }
    }

    pub fn is_collector(&self) -> bool {
        self.kind == COLLECTOR_RESPONSE_TYPE
    }

    pub fn decode(body: &[u8]) -> Result<Self, ContractError> {
        serde_json::from_slice(body).map_err(|e| ContractError::decode(e.to_string()))
    }

    pub fn encode(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(|e| ContractError::encode(e.to_string()))
    }
}
