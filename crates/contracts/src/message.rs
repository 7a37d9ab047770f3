//! MessageBody - check output before encoding
//!
//! The wire encoding is owned by the message type itself; the pipeline only
//! asks for bytes and a few counters used in delivery headers.

use std::fmt;

use crate::ContractError;

/// A single message produced by a check run
pub trait MessageBody: Send + Sync + fmt::Debug {
    /// Encode the message into its wire representation
    fn encode(&self) -> Result<Vec<u8>, ContractError>;

    /// Number of containers described by this message
    fn container_count(&self) -> usize {
        0
    }

    /// Number of processes described by this message
    fn process_count(&self) -> usize {
        0
    }

    /// Whether this message is an orchestrator manifest (shipped zstd-encoded)
    fn is_manifest(&self) -> bool {
        false
    }
}

/// Owned, type-erased message
pub type BoxedMessage = Box<dyn MessageBody>;
