//! Per-domain response handling

use contracts::{CollectorStatus, Endpoint, ResponseEnvelope, ResponseStream};
use tracing::error;

use crate::metrics::DispatcherMetrics;

/// Drain `responses` and collect the usable collector statuses
///
/// Transport errors, non-2xx codes, undecodable bodies, error messages and
/// unexpected response types are logged per domain and skipped. Bodies from
/// endpoints that never carry a status are not decoded.
pub async fn read_response_statuses(
    check: &str,
    endpoint: Endpoint,
    mut responses: ResponseStream,
    metrics: &DispatcherMetrics,
) -> Vec<CollectorStatus> {
    let mut statuses = Vec::new();

    while let Some(response) = responses.recv().await {
        if let Some(err) = &response.error {
            error!(check = %check, domain = %response.domain, error = %err, "Error from domain");
            domain_failed(metrics, endpoint, &response.domain);
            continue;
        }

        if response.status_code >= 300 {
            error!(
                check = %check,
                domain = %response.domain,
                status = response.status_code,
                "Invalid response from domain"
            );
            domain_failed(metrics, endpoint, &response.domain);
            continue;
        }

        observability::record_domain_response(endpoint.as_str(), &response.domain, true);
        if !endpoint.carries_status() {
            continue;
        }

        let envelope = match ResponseEnvelope::decode(&response.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(check = %check, domain = %response.domain, error = %e, "Could not decode response body");
                metrics.inc_domain_errors();
                continue;
            }
        };

        if !envelope.is_collector() {
            error!(
                check = %check,
                domain = %response.domain,
                kind = %envelope.kind,
                "Unexpected response type from domain"
            );
            metrics.inc_domain_errors();
            continue;
        }

        if !envelope.message.is_empty() {
            error!(
                check = %check,
                domain = %response.domain,
                message = %envelope.message,
                "Error in response from domain"
            );
            metrics.inc_domain_errors();
            continue;
        }

        match envelope.status {
            Some(status) => statuses.push(status),
            None => {
                error!(check = %check, domain = %response.domain, "Collector response without status");
                metrics.inc_domain_errors();
            }
        }
    }

    metrics.add_statuses(statuses.len() as u64);
    statuses
}

fn domain_failed(metrics: &DispatcherMetrics, endpoint: Endpoint, domain: &str) {
    metrics.inc_domain_errors();
    observability::record_domain_response(endpoint.as_str(), domain, false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::ForwarderResponse;
    use tokio::sync::mpsc;

    fn stream(responses: Vec<ForwarderResponse>) -> ResponseStream {
        let (tx, rx) = mpsc::channel(responses.len().max(1));
        for response in responses {
            tx.try_send(response).unwrap();
        }
        rx
    }

    fn collector(active_clients: i32, interval: i32) -> Bytes {
        ResponseEnvelope::collector(CollectorStatus {
            active_clients,
            interval,
        })
        .encode()
        .unwrap()
        .into()
    }

    #[tokio::test]
    async fn test_statuses_from_every_domain() {
        let metrics = DispatcherMetrics::new();
        let responses = stream(vec![
            ForwarderResponse::ok("a.example", collector(0, 5)),
            ForwarderResponse::ok("b.example", collector(3, 10)),
        ]);

        let statuses = read_response_statuses("process", Endpoint::Process, responses, &metrics).await;
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[1].active_clients, 3);
        assert_eq!(metrics.statuses(), 2);
    }

    #[tokio::test]
    async fn test_bad_domains_skipped() {
        let metrics = DispatcherMetrics::new();
        let mut rejected = ForwarderResponse::ok("c.example", collector(1, 2));
        rejected.status_code = 503;
        let responses = stream(vec![
            ForwarderResponse::failed("a.example", "connection reset"),
            ForwarderResponse::ok("b.example", Bytes::from_static(b"not json")),
            rejected,
            ForwarderResponse::ok(
                "d.example",
                ResponseEnvelope::error("quota exceeded").encode().unwrap(),
            ),
            ForwarderResponse::ok("e.example", collector(2, 2)),
        ]);

        let statuses =
            read_response_statuses("container", Endpoint::Container, responses, &metrics).await;
        assert_eq!(statuses, vec![CollectorStatus { active_clients: 2, interval: 2 }]);
        assert_eq!(metrics.domain_errors(), 4);
    }

    #[tokio::test]
    async fn test_orchestrator_bodies_ignored() {
        let metrics = DispatcherMetrics::new();
        let responses = stream(vec![ForwarderResponse::ok("a.example", collector(4, 2))]);

        let statuses =
            read_response_statuses("pod", Endpoint::OrchestratorChecks, responses, &metrics).await;
        assert!(statuses.is_empty());
        assert_eq!(metrics.domain_errors(), 0);
    }
}
