//! Forwarder trait - Dispatcher output interface
//!
//! A forwarder ships one payload to every configured backend domain and
//! streams back one response per domain.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{ContractError, PayloadHeaders};

/// Backend endpoint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Process,
    RealTimeProcess,
    Container,
    RealTimeContainer,
    Connections,
    OrchestratorChecks,
    OrchestratorManifests,
    ProcessDiscovery,
    ProcessEvents,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::RealTimeProcess => "rtprocess",
            Self::Container => "container",
            Self::RealTimeContainer => "rtcontainer",
            Self::Connections => "connections",
            Self::OrchestratorChecks => "orchestrator",
            Self::OrchestratorManifests => "orchestrator_manifest",
            Self::ProcessDiscovery => "process_discovery",
            Self::ProcessEvents => "process_events",
        }
    }

    /// Whether responses from this endpoint may toggle real-time mode
    pub fn affects_real_time(&self) -> bool {
        !matches!(
            self,
            Self::OrchestratorChecks
                | Self::OrchestratorManifests
                | Self::ProcessDiscovery
                | Self::ProcessEvents
        )
    }

    /// Whether response bodies from this endpoint carry a collector status
    pub fn carries_status(&self) -> bool {
        !matches!(
            self,
            Self::OrchestratorChecks | Self::OrchestratorManifests | Self::ProcessEvents
        )
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of one backend domain to one submission
#[derive(Debug, Clone)]
pub struct ForwarderResponse {
    pub domain: String,
    pub status_code: u16,
    pub body: Bytes,
    /// Transport-level failure, if any
    pub error: Option<String>,
}

impl ForwarderResponse {
    /// Successful response with a body
    pub fn ok(domain: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            domain: domain.into(),
            status_code: 200,
            body: body.into(),
            error: None,
        }
    }

    /// Transport failure
    pub fn failed(domain: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            status_code: 0,
            body: Bytes::new(),
            error: Some(error.into()),
        }
    }
}

/// Stream of per-domain responses; ends when every domain has answered
pub type ResponseStream = mpsc::Receiver<ForwarderResponse>;

/// Payload delivery trait
///
/// All methods take `&self` so one forwarder can be shared between its
/// dispatcher and the orchestrator that stops it.
#[trait_variant::make(Forwarder: Send)]
pub trait LocalForwarder {
    /// Forwarder name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Start delivery machinery
    ///
    /// # Errors
    /// Start failure is fatal for the pipeline
    async fn start(&self) -> Result<(), ContractError>;

    /// Submit one payload to `endpoint` on every domain
    async fn submit(
        &self,
        endpoint: Endpoint,
        body: Bytes,
        headers: &PayloadHeaders,
    ) -> Result<ResponseStream, ContractError>;

    /// Stop delivery machinery
    async fn stop(&self);
}
