//! Forwarder implementations

mod file;
mod log;

pub use file::{FileForwarder, FileForwarderConfig};
pub use log::{LogForwarder, LogForwarderConfig};

use bytes::Bytes;
use contracts::{
    ContractError, Endpoint, Forwarder, ForwarderConfig, ForwarderKind, PayloadHeaders,
    ResponseStream,
};
use tracing::instrument;

use crate::error::DispatcherError;

/// Forwarder selected by configuration
pub enum ConfiguredForwarder {
    Log(LogForwarder),
    File(FileForwarder),
}

impl Forwarder for ConfiguredForwarder {
    fn name(&self) -> &str {
        match self {
            Self::Log(f) => f.name(),
            Self::File(f) => f.name(),
        }
    }

    async fn start(&self) -> Result<(), ContractError> {
        match self {
            Self::Log(f) => f.start().await,
            Self::File(f) => f.start().await,
        }
    }

    async fn submit(
        &self,
        endpoint: Endpoint,
        body: Bytes,
        headers: &PayloadHeaders,
    ) -> Result<ResponseStream, ContractError> {
        match self {
            Self::Log(f) => f.submit(endpoint, body, headers).await,
            Self::File(f) => f.submit(endpoint, body, headers).await,
        }
    }

    async fn stop(&self) {
        match self {
            Self::Log(f) => f.stop().await,
            Self::File(f) => f.stop().await,
        }
    }
}

/// Create a forwarder from configuration
#[instrument(name = "dispatcher_create_forwarder", skip(config), fields(kind = ?config.kind))]
pub fn create_forwarder(
    name: &str,
    config: &ForwarderConfig,
) -> Result<ConfiguredForwarder, DispatcherError> {
    match config.kind {
        ForwarderKind::Log => {
            let config = LogForwarderConfig::from_params(&config.params)
                .map_err(|e| DispatcherError::forwarder_creation(name, e.to_string()))?;
            Ok(ConfiguredForwarder::Log(LogForwarder::new(name, config)))
        }
        ForwarderKind::File => {
            let config = FileForwarderConfig::from_params(&config.params)
                .map_err(|e| DispatcherError::forwarder_creation(name, e.to_string()))?;
            Ok(ConfiguredForwarder::File(FileForwarder::new(name, config)))
        }
    }
}
