//! Scheduler error types

use thiserror::Error;

/// Scheduler construction errors (fatal at startup)
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Interval unusable for a ticker
    #[error("invalid interval for check '{check}': {message}")]
    InvalidInterval { check: String, message: String },
}

impl SchedulerError {
    pub fn invalid_interval(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInterval {
            check: check.into(),
            message: message.into(),
        }
    }
}
