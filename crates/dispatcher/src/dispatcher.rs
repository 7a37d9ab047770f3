//! Dispatcher - drains one result queue into a forwarder

use std::collections::HashSet;
use std::sync::Arc;

use contracts::{CheckResult, Forwarder};
use realtime::RealTimeController;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};
use weighted_queue::WeightedQueue;

use crate::metrics::DispatcherMetrics;
use crate::responses::read_response_statuses;
use crate::routing::route;

/// Dispatcher configuration
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Check names whose payloads are never submitted
    pub drop_check_payloads: Vec<String>,
    /// Whether backend statuses may drive real-time mode
    pub run_real_time: bool,
}

/// Consumer of one result queue
///
/// Runs until the queue is stopped. Payloads of one result are submitted
/// in order, each waiting for all of its domain responses.
pub struct Dispatcher<F> {
    queue: Arc<WeightedQueue<CheckResult>>,
    forwarder: Arc<F>,
    controller: Arc<RealTimeController>,
    drop_list: HashSet<String>,
    run_real_time: bool,
    metrics: Arc<DispatcherMetrics>,
}

impl<F> Dispatcher<F>
where
    F: Forwarder + Sync + 'static,
{
    pub fn new(
        queue: Arc<WeightedQueue<CheckResult>>,
        forwarder: Arc<F>,
        controller: Arc<RealTimeController>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            queue,
            forwarder,
            controller,
            drop_list: config.drop_check_payloads.into_iter().collect(),
            run_real_time: config.run_real_time,
            metrics: Arc::new(DispatcherMetrics::new()),
        }
    }

    /// Shared metrics handle (stays valid after the dispatcher exits)
    pub fn metrics(&self) -> Arc<DispatcherMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the dispatcher main loop
    #[instrument(name = "dispatcher_run", skip(self), fields(queue = %self.queue.name()))]
    pub async fn run(self) {
        info!(queue = %self.queue.name(), forwarder = %self.forwarder.name(), "Dispatcher started");

        let mut results: u64 = 0;
        while let Some(result) = self.queue.poll().await {
            results += 1;
            self.dispatch_result(&result).await;

            if results % 100 == 0 {
                debug!(queue = %self.queue.name(), results, "Dispatcher progress");
            }
        }

        info!(
            queue = %self.queue.name(),
            results,
            submitted = self.metrics.submitted(),
            "Dispatcher queue stopped, exiting"
        );
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn dispatch_result(&self, result: &CheckResult) {
        let name = result.name();

        for payload in result.payloads() {
            if self.drop_list.contains(name) {
                self.metrics.inc_dropped();
                observability::record_payload_dispatched(name, "dropped");
                continue;
            }

            let Some(endpoint) = route(name, &payload.headers) else {
                error!(check = %name, "Unable to submit payload: unsupported payload type");
                self.metrics.inc_unroutable();
                observability::record_payload_dispatched(name, "unroutable");
                continue;
            };

            let responses = match self
                .forwarder
                .submit(endpoint, payload.body.clone(), &payload.headers)
                .await
            {
                Ok(responses) => responses,
                Err(e) => {
                    error!(check = %name, endpoint = %endpoint, error = %e, "Unable to submit payload");
                    self.metrics.inc_submit_failures();
                    observability::record_payload_dispatched(name, "failed");
                    continue;
                }
            };
            self.metrics.inc_submitted();
            observability::record_payload_dispatched(name, "submitted");

            let statuses = read_response_statuses(name, endpoint, responses, &self.metrics).await;
            if !statuses.is_empty() && self.run_real_time && endpoint.affects_real_time() {
                self.controller.update(&statuses);
            }
        }
    }
}
