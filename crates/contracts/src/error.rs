//! Layered error definitions
//!
//! Categorized by source: config / check / encoding / forwarder

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Check Errors =====
    /// Check initialization error
    #[error("check '{check}' init error: {message}")]
    CheckInit { check: String, message: String },

    /// Check run error
    #[error("check '{check}' run error: {message}")]
    CheckRun { check: String, message: String },

    // ===== Encoding Errors =====
    /// Message could not be encoded into a payload body
    #[error("payload encode error: {message}")]
    Encode { message: String },

    /// Response body could not be decoded
    #[error("response decode error: {message}")]
    Decode { message: String },

    // ===== Forwarder Errors =====
    /// Forwarder failed to start
    #[error("forwarder '{forwarder}' start error: {message}")]
    ForwarderStart { forwarder: String, message: String },

    /// Submission rejected before reaching any domain
    #[error("forwarder '{forwarder}' submit error: {message}")]
    Submit { forwarder: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create check run error
    pub fn check_run(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CheckRun {
            check: check.into(),
            message: message.into(),
        }
    }

    /// Create check init error
    pub fn check_init(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CheckInit {
            check: check.into(),
            message: message.into(),
        }
    }

    /// Create encode error
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create forwarder submit error
    pub fn submit(forwarder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Submit {
            forwarder: forwarder.into(),
            message: message.into(),
        }
    }

    /// Create forwarder start error
    pub fn forwarder_start(forwarder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ForwarderStart {
            forwarder: forwarder.into(),
            message: message.into(),
        }
    }
}
