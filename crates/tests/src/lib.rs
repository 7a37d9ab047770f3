//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 完整采集器 e2e 测试（检查 → 队列 → 分发 → 转发器 → 实时反馈）

#[cfg(test)]
mod contract_tests {
    use contracts::{check_names, Endpoint};

    #[test]
    fn test_check_names_are_stable() {
        assert_eq!(check_names::ALL.len(), 8);
        assert!(check_names::ALL.contains(&"process_discovery"));
    }

    #[test]
    fn test_endpoint_real_time_influence() {
        assert!(Endpoint::Process.affects_real_time());
        assert!(Endpoint::RealTimeContainer.affects_real_time());
        assert!(!Endpoint::OrchestratorManifests.affects_real_time());
        assert!(!Endpoint::ProcessDiscovery.affects_real_time());
        // discovery still answers with a status, it just does not count
        assert!(Endpoint::ProcessDiscovery.carries_status());
        assert!(!Endpoint::ProcessEvents.carries_status());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bytes::Bytes;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        headers, AgentConfig, CheckSpec, CollectorStatus, ContractError, Endpoint, Forwarder,
        ForwarderConfig, ForwarderKind, ForwarderResponse, PayloadHeaders, ResponseEnvelope,
        ResponseStream,
    };
    use process_agent_cli::Collector;
    use tokio::sync::mpsc;

    /// What every recording forwarder saw
    #[derive(Default)]
    struct Recorder {
        status: Mutex<CollectorStatus>,
        submissions: Mutex<Vec<(Endpoint, PayloadHeaders)>>,
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl Recorder {
        fn with_status(active_clients: i32, interval: i32) -> Arc<Self> {
            let recorder = Self::default();
            *recorder.status.lock().unwrap() = CollectorStatus {
                active_clients,
                interval,
            };
            Arc::new(recorder)
        }

        fn count(&self, endpoint: Endpoint) -> usize {
            self.submissions
                .lock()
                .unwrap()
                .iter()
                .filter(|(e, _)| *e == endpoint)
                .count()
        }

        fn first_headers(&self, endpoint: Endpoint) -> Option<PayloadHeaders> {
            self.submissions
                .lock()
                .unwrap()
                .iter()
                .find(|(e, _)| *e == endpoint)
                .map(|(_, h)| h.clone())
        }
    }

    /// One per queue, all sharing a recorder; answers as a single domain
    struct RecordingForwarder {
        recorder: Arc<Recorder>,
    }

    impl Forwarder for RecordingForwarder {
        fn name(&self) -> &str {
            "recording"
        }

        async fn start(&self) -> Result<(), ContractError> {
            self.recorder.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn submit(
            &self,
            endpoint: Endpoint,
            _body: Bytes,
            headers: &PayloadHeaders,
        ) -> Result<ResponseStream, ContractError> {
            self.recorder
                .submissions
                .lock()
                .unwrap()
                .push((endpoint, headers.clone()));

            let body = if endpoint.carries_status() {
                let status = *self.recorder.status.lock().unwrap();
                ResponseEnvelope::collector(status).encode()?
            } else {
                Vec::new()
            };
            let (tx, rx) = mpsc::channel(1);
            tx.try_send(ForwarderResponse::ok("https://process.test", body))
                .map_err(|e| ContractError::submit("recording", e.to_string()))?;
            Ok(rx)
        }

        async fn stop(&self) {
            self.recorder.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn collector(config: AgentConfig, recorder: &Arc<Recorder>) -> Collector<RecordingForwarder> {
        let checks = checks::build_checks(&config.checks);
        Collector::new(config, checks, |_| {
            Ok(RecordingForwarder {
                recorder: Arc::clone(recorder),
            })
        })
        .unwrap()
    }

    fn config_with(names: &[&str]) -> AgentConfig {
        AgentConfig {
            checks: names.iter().map(|n| CheckSpec::named(*n)).collect(),
            ..AgentConfig::default()
        }
    }

    const AGENT_TOML: &str = r#"
hostname = "e2e-host"

[check_intervals]
connections = 5

[[checks]]
name = "process"
messages = 2

[[checks]]
name = "connections"
"#;

    /// Configuration file → checks → queues → dispatchers → forwarder
    #[tokio::test(start_paused = true)]
    async fn test_e2e_payloads_delivered_with_headers() {
        let config = ConfigLoader::load_from_str(AGENT_TOML, ConfigFormat::Toml).unwrap();
        let recorder = Recorder::with_status(0, 2);
        let collector = collector(config, &recorder);
        let last_runs = collector.last_runs();

        let stats = collector
            .run(tokio::time::sleep(Duration::from_millis(12_500)))
            .await
            .unwrap();

        // process: two messages per run, priming run plus t=10s
        // connections: priming run plus t=5s and t=10s
        assert_eq!(recorder.count(Endpoint::Process), 4);
        assert_eq!(recorder.count(Endpoint::Connections), 3);
        assert_eq!(recorder.count(Endpoint::RealTimeProcess), 0);

        let sent = recorder.first_headers(Endpoint::Process).unwrap();
        assert_eq!(sent.get(headers::HOST), Some("e2e-host"));
        assert_eq!(
            sent.get(headers::CONTENT_TYPE),
            Some(headers::PROTOBUF_CONTENT_TYPE)
        );
        assert!(sent.get(headers::TIMESTAMP).is_some());

        assert_eq!(last_runs.get("process").unwrap().messages, 2);
        assert!(stats.last_collect.is_some());
        assert!(!stats.real_time_enabled);
        assert_eq!(stats.dispatch.submitted, 7);

        assert_eq!(recorder.starts.load(Ordering::SeqCst), 5);
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 5);
    }

    /// Backend reports a client: real-time output starts flowing
    #[tokio::test(start_paused = true)]
    async fn test_e2e_status_feedback_enables_real_time() {
        let recorder = Recorder::with_status(1, 1);
        let collector = collector(config_with(&["process"]), &recorder);
        let controller = collector.controller();

        let stats = collector
            .run(tokio::time::sleep(Duration::from_millis(5_500)))
            .await
            .unwrap();

        assert!(controller.state().is_enabled());
        assert!(stats.real_time_enabled);
        assert_eq!(stats.real_time_interval, Duration::from_secs(1));
        assert!(recorder.count(Endpoint::RealTimeProcess) >= 3);
        assert_eq!(recorder.count(Endpoint::Process), 1);
    }

    /// A real-time-only check starts at its configured interval
    #[tokio::test(start_paused = true)]
    async fn test_e2e_real_time_only_check_uses_configured_interval() {
        // backend asks for the startup interval, so no update is broadcast
        let recorder = Recorder::with_status(1, 2);
        let mut config = config_with(&["connections", "rtprocess"]);
        config.check_intervals.insert("rtprocess".into(), 3);
        let collector = collector(config, &recorder);

        let stats = collector
            .run(tokio::time::sleep(Duration::from_millis(9_500)))
            .await
            .unwrap();

        assert!(stats.real_time_enabled);
        // ticks at 3s, 6s and 9s; a 2s cadence would have run four times
        let rt_runs = stats
            .checks
            .iter()
            .find(|c| c.name == "rtprocess")
            .map(|c| c.stats.runs);
        assert_eq!(rt_runs, Some(3));
        assert_eq!(recorder.count(Endpoint::RealTimeProcess), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_disabled_real_time_ignores_status() {
        let recorder = Recorder::with_status(3, 1);
        let mut config = config_with(&["process", "rtprocess"]);
        config.disable_realtime_checks = true;
        let collector = collector(config, &recorder);

        let stats = collector
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap();

        assert!(!stats.real_time_enabled);
        assert_eq!(recorder.count(Endpoint::RealTimeProcess), 0);
        assert!(recorder.count(Endpoint::Process) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_drop_list() {
        let recorder = Recorder::with_status(0, 2);
        let mut config = config_with(&["process", "connections"]);
        config.drop_check_payloads = vec!["connections".into()];
        let collector = collector(config, &recorder);

        let stats = collector
            .run(tokio::time::sleep(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(recorder.count(Endpoint::Connections), 0);
        assert_eq!(recorder.count(Endpoint::Process), 1);
        assert_eq!(stats.dispatch.dropped, 1);
    }

    /// Pod output splits into metadata and manifests; neither toggles real time
    #[tokio::test(start_paused = true)]
    async fn test_e2e_pod_manifests() {
        let recorder = Recorder::with_status(4, 1);
        let mut config = config_with(&["pod"]);
        config.orchestrator.collection_enabled = true;
        config.orchestrator.manifest_collection_enabled = true;
        config.orchestrator.cluster_id = Some("cluster-7".into());
        let collector = collector(config, &recorder);

        let stats = collector
            .run(tokio::time::sleep(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(recorder.count(Endpoint::OrchestratorChecks), 1);
        assert_eq!(recorder.count(Endpoint::OrchestratorManifests), 1);
        let manifest = recorder
            .first_headers(Endpoint::OrchestratorManifests)
            .unwrap();
        assert_eq!(
            manifest.get(headers::CONTENT_ENCODING),
            Some(headers::ZSTD_CONTENT_ENCODING)
        );
        assert_eq!(manifest.get(headers::CLUSTER_ID), Some("cluster-7"));
        assert!(!stats.real_time_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_failing_check_keeps_running() {
        let recorder = Recorder::with_status(0, 2);
        let mut config = config_with(&["connections"]);
        config.check_intervals.insert("connections".into(), 1);
        config.checks[0].fail_every = 2;
        let collector = collector(config, &recorder);

        let stats = collector
            .run(tokio::time::sleep(Duration::from_millis(3_500)))
            .await
            .unwrap();

        // runs at 0,1,2,3s; the 2nd and 4th fail
        assert_eq!(stats.total_runs(), 2);
        assert_eq!(stats.total_failures(), 2);
        assert_eq!(recorder.count(Endpoint::Connections), 2);
    }

    /// File forwarder writes one JSON line per payload
    #[tokio::test(start_paused = true)]
    async fn test_e2e_file_forwarder() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with(&["connections"]);
        config.forwarder = ForwarderConfig {
            kind: ForwarderKind::File,
            params: [(
                "base_path".to_string(),
                dir.path().display().to_string(),
            )]
            .into_iter()
            .collect(),
        };
        let forwarder_config = config.forwarder.clone();
        let checks = checks::build_checks(&config.checks);
        let collector = Collector::new(config, checks, |queue| {
            dispatcher::create_forwarder(queue, &forwarder_config)
        })
        .unwrap();

        let stats = collector
            .run(tokio::time::sleep(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(stats.dispatch.submitted, 1);

        let written = std::fs::read_to_string(dir.path().join("connections.jsonl")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 1);
        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["endpoint"], "connections");
        assert_eq!(record["size"], 1024);
    }
}
