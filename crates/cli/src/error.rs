//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Failed to load configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// A forwarder could not be created or started
    #[error("Forwarder '{name}' failed to start: {message}")]
    ForwarderStart { name: String, message: String },

    /// A scheduler could not be constructed
    #[error("Failed to start check scheduler: {0}")]
    Scheduler(#[from] scheduler::SchedulerError),

    /// Dispatcher setup error
    #[error("Failed to set up dispatcher: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn forwarder_start(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ForwarderStart {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
