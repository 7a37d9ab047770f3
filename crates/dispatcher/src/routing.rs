//! Check name → backend endpoint

use contracts::{check_names, headers, Endpoint, PayloadHeaders};

/// Resolve the endpoint for a payload of check `check`
///
/// Pod payloads split on their content encoding: zstd bodies are
/// manifests. Returns `None` for names without a route.
pub fn route(check: &str, payload_headers: &PayloadHeaders) -> Option<Endpoint> {
    let endpoint = match check {
        check_names::PROCESS => Endpoint::Process,
        check_names::RT_PROCESS => Endpoint::RealTimeProcess,
        check_names::CONTAINER => Endpoint::Container,
        check_names::RT_CONTAINER => Endpoint::RealTimeContainer,
        check_names::CONNECTIONS => Endpoint::Connections,
        check_names::POD => {
            if payload_headers.get(headers::CONTENT_ENCODING) == Some(headers::ZSTD_CONTENT_ENCODING)
            {
                Endpoint::OrchestratorManifests
            } else {
                Endpoint::OrchestratorChecks
            }
        }
        check_names::PROCESS_DISCOVERY => Endpoint::ProcessDiscovery,
        check_names::PROCESS_EVENTS => Endpoint::ProcessEvents,
        _ => return None,
    };
    Some(endpoint)
}
