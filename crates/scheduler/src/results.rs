//! Message → CheckResult conversion

use chrono::{DateTime, Utc};
use contracts::{check_names, headers, BoxedMessage, CheckResult, Payload, PayloadHeaders};
use tracing::error;

/// Host and orchestrator settings stamped onto every payload
#[derive(Debug, Clone, Default)]
pub struct PayloadSettings {
    pub hostname: String,
    pub agent_version: String,
    pub orchestration_enabled: bool,
    pub manifest_collection_enabled: bool,
    pub cluster_id: Option<String>,
}

/// Encodes check output and attaches delivery headers
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    settings: PayloadSettings,
}

impl ResultBuilder {
    pub fn new(settings: PayloadSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PayloadSettings {
        &self.settings
    }

    /// Build the results for one run of `name`
    ///
    /// The pod check returns metadata in its first half and manifests in
    /// its second half; manifests only ship when manifest collection is on.
    pub fn build(
        &self,
        start: DateTime<Utc>,
        name: &str,
        mut messages: Vec<BoxedMessage>,
    ) -> Vec<CheckResult> {
        if name != check_names::POD {
            return self.to_result(start, name, &messages).into_iter().collect();
        }

        let manifests = messages.split_off(messages.len() / 2);
        let mut results: Vec<CheckResult> = self.to_result(start, name, &messages).into_iter().collect();
        if self.settings.manifest_collection_enabled {
            results.extend(self.to_result(start, name, &manifests));
        }
        results
    }

    /// Encode messages into a single result
    ///
    /// Messages that fail to encode are logged and skipped. Returns `None`
    /// when nothing is left to ship.
    pub fn to_result(
        &self,
        start: DateTime<Utc>,
        name: &str,
        messages: &[BoxedMessage],
    ) -> Option<CheckResult> {
        if messages.is_empty() {
            return None;
        }

        let payloads: Vec<Payload> = messages
            .iter()
            .filter_map(|message| match message.encode() {
                Ok(body) => Some(Payload {
                    body: body.into(),
                    headers: self.headers_for(start, name, message.as_ref()),
                }),
                Err(e) => {
                    error!(check = %name, error = %e, "Unable to encode message");
                    observability::record_encode_failure(name);
                    None
                }
            })
            .collect();

        if payloads.is_empty() {
            return None;
        }
        Some(CheckResult::new(name, payloads))
    }

    fn headers_for(
        &self,
        start: DateTime<Utc>,
        name: &str,
        message: &dyn contracts::MessageBody,
    ) -> PayloadHeaders {
        let mut h = PayloadHeaders::new();
        h.set(headers::TIMESTAMP, start.timestamp().to_string());
        h.set(headers::HOST, self.settings.hostname.as_str());
        h.set(headers::PROCESS_VERSION, self.settings.agent_version.as_str());
        h.set(headers::CONTAINER_COUNT, message.container_count().to_string());
        h.set(headers::CONTENT_TYPE, headers::PROTOBUF_CONTENT_TYPE);

        if self.settings.orchestration_enabled {
            if let Some(cluster_id) = self.settings.cluster_id.as_deref().filter(|c| !c.is_empty()) {
                h.set(headers::CLUSTER_ID, cluster_id);
            }
            self.set_origin(&mut h);
            if message.is_manifest() {
                h.set(headers::CONTENT_ENCODING, headers::ZSTD_CONTENT_ENCODING);
            }
        }

        if name == check_names::PROCESS_EVENTS {
            self.set_origin(&mut h);
        }
        h
    }

    fn set_origin(&self, h: &mut PayloadHeaders) {
        h.set(headers::EVP_ORIGIN, headers::AGENT_ORIGIN);
        h.set(headers::EVP_ORIGIN_VERSION, self.settings.agent_version.as_str());
    }
}
