//! FileForwarder - appends one JSON line per payload to a per-endpoint file

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use contracts::{
    CollectorStatus, ContractError, Endpoint, Forwarder, ForwarderResponse, PayloadHeaders,
    ResponseEnvelope, ResponseStream,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, instrument};

/// Configuration for FileForwarder
#[derive(Debug, Clone)]
pub struct FileForwarderConfig {
    /// Output directory
    pub base_path: PathBuf,
}

impl FileForwarderConfig {
    /// Create config from params map; `base_path` is required
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let base_path = params
            .get("base_path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ContractError::config_validation("forwarder.params.base_path", "required")
            })?;
        Ok(Self { base_path })
    }
}

#[derive(Debug, Serialize)]
struct PayloadRecord<'a> {
    written_at: DateTime<Utc>,
    endpoint: Endpoint,
    size: usize,
    headers: &'a PayloadHeaders,
}

/// Forwarder that records payloads on disk
///
/// The single "domain" is the output directory. It reports zero active
/// clients, so real-time mode stays off.
pub struct FileForwarder {
    name: String,
    config: FileForwarderConfig,
    write_lock: Mutex<()>,
}

impl FileForwarder {
    pub fn new(name: impl Into<String>, config: FileForwarderConfig) -> Self {
        Self {
            name: name.into(),
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// File receiving payloads for `endpoint`
    pub fn path_for(&self, endpoint: Endpoint) -> PathBuf {
        self.config.base_path.join(format!("{}.jsonl", endpoint.as_str()))
    }

    async fn append(&self, endpoint: Endpoint, line: Vec<u8>) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(endpoint))
            .await?;
        file.write_all(&line).await?;
        file.flush().await
    }

    fn domain(&self) -> String {
        self.config.base_path.display().to_string()
    }
}

impl Forwarder for FileForwarder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), ContractError> {
        tokio::fs::create_dir_all(&self.config.base_path)
            .await
            .map_err(|e| ContractError::forwarder_start(&self.name, e.to_string()))?;
        info!(forwarder = %self.name, path = %self.config.base_path.display(), "FileForwarder started");
        Ok(())
    }

    #[instrument(
        name = "file_forwarder_submit",
        skip(self, body, headers),
        fields(forwarder = %self.name, endpoint = %endpoint)
    )]
    async fn submit(
        &self,
        endpoint: Endpoint,
        body: Bytes,
        headers: &PayloadHeaders,
    ) -> Result<ResponseStream, ContractError> {
        let record = PayloadRecord {
            written_at: Utc::now(),
            endpoint,
            size: body.len(),
            headers,
        };
        let mut line =
            serde_json::to_vec(&record).map_err(|e| ContractError::encode(e.to_string()))?;
        line.push(b'\n');

        let (tx, rx) = mpsc::channel(1);
        let response = match self.append(endpoint, line).await {
            Ok(()) => {
                debug!(forwarder = %self.name, endpoint = %endpoint, bytes = body.len(), "Payload written");
                let body = if endpoint.carries_status() {
                    ResponseEnvelope::collector(CollectorStatus::default()).encode()?
                } else {
                    Vec::new()
                };
                ForwarderResponse::ok(self.domain(), body)
            }
            Err(e) => {
                error!(forwarder = %self.name, endpoint = %endpoint, error = %e, "Failed to write payload");
                ForwarderResponse::failed(self.domain(), e.to_string())
            }
        };
        tx.send(response)
            .await
            .map_err(|e| ContractError::submit(&self.name, e.to_string()))?;
        Ok(rx)
    }

    async fn stop(&self) {
        info!(forwarder = %self.name, "FileForwarder stopped");
    }
}
