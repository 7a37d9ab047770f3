//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Forwarder creation error
    #[error("failed to create forwarder '{name}': {message}")]
    ForwarderCreation { name: String, message: String },

    /// Forwarder error (from contract)
    #[error("forwarder error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a forwarder creation error
    pub fn forwarder_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ForwarderCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
