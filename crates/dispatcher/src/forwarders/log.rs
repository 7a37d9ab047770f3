//! LogForwarder - logs payload summaries and answers with a synthetic status

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use contracts::{
    CollectorStatus, ContractError, Endpoint, Forwarder, ForwarderResponse, PayloadHeaders,
    ResponseEnvelope, ResponseStream,
};
use tokio::sync::mpsc;
use tracing::{info, instrument};

const DEFAULT_DOMAIN: &str = "https://process.datadoghq.com";

/// Configuration for LogForwarder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogForwarderConfig {
    /// Domains answering each submission
    pub domains: Vec<String>,
    /// Status every domain reports back
    pub status: CollectorStatus,
}

impl Default for LogForwarderConfig {
    fn default() -> Self {
        Self {
            domains: vec![DEFAULT_DOMAIN.to_string()],
            status: CollectorStatus::default(),
        }
    }
}

impl LogForwarderConfig {
    /// Create config from params map
    ///
    /// Keys: `domains` (comma separated), `active_clients`, `interval`.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let mut config = Self::default();

        if let Some(domains) = params.get("domains") {
            config.domains = domains
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
            if config.domains.is_empty() {
                return Err(ContractError::config_validation(
                    "forwarder.params.domains",
                    "at least one domain required",
                ));
            }
        }
        if let Some(v) = params.get("active_clients") {
            config.status.active_clients = parse_param("active_clients", v)?;
        }
        if let Some(v) = params.get("interval") {
            config.status.interval = parse_param("interval", v)?;
        }
        Ok(config)
    }
}

fn parse_param(key: &str, value: &str) -> Result<i32, ContractError> {
    value.trim().parse().map_err(|_| {
        ContractError::config_validation(
            format!("forwarder.params.{key}"),
            format!("expected an integer, got '{value}'"),
        )
    })
}

/// Forwarder that logs payload summaries for debugging
///
/// Every domain answers 200; endpoints that carry a status get the
/// configured collector status back.
pub struct LogForwarder {
    name: String,
    domains: Vec<String>,
    status: Mutex<CollectorStatus>,
    submitted: AtomicU64,
}

impl LogForwarder {
    pub fn new(name: impl Into<String>, config: LogForwarderConfig) -> Self {
        Self {
            name: name.into(),
            domains: config.domains,
            status: Mutex::new(config.status),
            submitted: AtomicU64::new(0),
        }
    }

    /// Replace the status reported by every domain
    pub fn set_status(&self, status: CollectorStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    fn response_body(&self, endpoint: Endpoint) -> Result<Bytes, ContractError> {
        if !endpoint.carries_status() {
            return Ok(Bytes::new());
        }
        let status = *self.status.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ResponseEnvelope::collector(status).encode()?.into())
    }
}

impl Forwarder for LogForwarder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), ContractError> {
        info!(forwarder = %self.name, domains = ?self.domains, "LogForwarder started");
        Ok(())
    }

    #[instrument(
        name = "log_forwarder_submit",
        skip(self, body, headers),
        fields(forwarder = %self.name, endpoint = %endpoint)
    )]
    async fn submit(
        &self,
        endpoint: Endpoint,
        body: Bytes,
        headers: &PayloadHeaders,
    ) -> Result<ResponseStream, ContractError> {
        let count = self.submitted.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            forwarder = %self.name,
            endpoint = %endpoint,
            bytes = body.len(),
            headers = headers.len(),
            submitted = count,
            "Payload submitted"
        );

        let response_body = self.response_body(endpoint)?;
        let (tx, rx) = mpsc::channel(self.domains.len().max(1));
        for domain in &self.domains {
            tx.send(ForwarderResponse::ok(domain.as_str(), response_body.clone()))
                .await
                .map_err(|e| ContractError::submit(&self.name, e.to_string()))?;
        }
        Ok(rx)
    }

    async fn stop(&self) {
        info!(forwarder = %self.name, submitted = self.submitted(), "LogForwarder stopped");
    }
}
