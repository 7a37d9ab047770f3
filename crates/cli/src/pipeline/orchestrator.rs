//! Collector orchestrator - wires checks, queues, dispatchers and forwarders.
//!
//! Startup order: init checks, build schedulers, start forwarders, spawn
//! dispatchers, spawn schedulers, spawn telemetry. Shutdown runs the other
//! way round once the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    AgentConfig, CheckResult, Forwarder, GroupIdGenerator, RegisteredCheck, SystemInfo,
};
use dispatcher::{Dispatcher, DispatcherConfig, DispatcherError, DispatcherMetrics, MetricsSnapshot};
use realtime::{RealTimeController, DEFAULT_REAL_TIME_INTERVAL};
use scheduler::{
    CheckScheduler, LastRunStore, PayloadSettings, ResultBuilder, SchedulerContext,
    SchedulerError, SchedulerExit,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use weighted_queue::WeightedQueue;

use super::queues::{CollectorQueues, QueueLimits};
use super::stats::{CheckSummary, PipelineStats};
use super::telemetry::{spawn_telemetry, TelemetryIntervals};
use crate::error::{CliError, Result};

/// Version reported in payload headers and the heartbeat gauge
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A queue and the forwarder draining it
struct QueueRoute<F> {
    queue: Arc<WeightedQueue<CheckResult>>,
    forwarder: Arc<F>,
}

/// Process collector
///
/// Owns the checks until [`Collector::run`] hands each one to its scheduler.
/// Shared state (real-time controller, last-run store, group ids) lives
/// here and is passed down by `Arc`.
pub struct Collector<F> {
    config: AgentConfig,
    checks: Vec<RegisteredCheck>,
    routes: Vec<QueueRoute<F>>,
    queues: Arc<CollectorQueues>,
    controller: Arc<RealTimeController>,
    last_runs: Arc<LastRunStore>,
    group_ids: GroupIdGenerator,
    telemetry: TelemetryIntervals,
}

impl<F> Collector<F>
where
    F: Forwarder + Sync + 'static,
{
    /// Create a collector with one forwarder per queue
    ///
    /// `make_forwarder` receives the queue name.
    pub fn new<M>(
        config: AgentConfig,
        checks: Vec<RegisteredCheck>,
        mut make_forwarder: M,
    ) -> Result<Self>
    where
        M: FnMut(&str) -> std::result::Result<F, DispatcherError>,
    {
        let queues = Arc::new(CollectorQueues::new(QueueLimits::from_config(&config)));
        let routes = queues
            .all()
            .into_iter()
            .map(|queue| {
                Ok(QueueRoute {
                    forwarder: Arc::new(make_forwarder(queue.name())?),
                    queue: Arc::clone(queue),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            checks,
            routes,
            queues,
            controller: Arc::new(RealTimeController::new(DEFAULT_REAL_TIME_INTERVAL)),
            last_runs: Arc::new(LastRunStore::new()),
            group_ids: GroupIdGenerator::new(rand::random::<i32>()),
            telemetry: TelemetryIntervals::default(),
        })
    }

    /// Override the telemetry periods
    pub fn with_telemetry(mut self, intervals: TelemetryIntervals) -> Self {
        self.telemetry = intervals;
        self
    }

    pub fn controller(&self) -> Arc<RealTimeController> {
        Arc::clone(&self.controller)
    }

    pub fn queues(&self) -> Arc<CollectorQueues> {
        Arc::clone(&self.queues)
    }

    pub fn last_runs(&self) -> Arc<LastRunStore> {
        Arc::clone(&self.last_runs)
    }

    /// Run until `shutdown` resolves, then shut everything down in order
    ///
    /// # Errors
    /// - A scheduler cannot be constructed
    /// - A forwarder fails to start
    #[instrument(name = "collector_run", skip_all, fields(host = %self.config.hostname))]
    pub async fn run<S>(self, shutdown: S) -> Result<PipelineStats>
    where
        S: Future<Output = ()> + Send,
    {
        let started = Instant::now();
        let Self {
            config,
            checks,
            routes,
            queues,
            controller,
            last_runs,
            group_ids,
            telemetry,
        } = self;
        let run_real_time = config.run_real_time();

        let checks = init_checks(checks, &system_info(&config));
        checks::enabled_check_names(&checks, run_real_time);
        if !config.drop_check_payloads.is_empty() {
            info!(checks = ?config.drop_check_payloads, "Dropping payloads of configured checks");
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ctx = SchedulerContext {
            builder: Arc::new(ResultBuilder::new(payload_settings(&config))),
            group_ids,
            real_time: controller.state(),
            run_real_time,
            last_runs: Arc::clone(&last_runs),
            shutdown: shutdown_rx.clone(),
        };

        let schedulers = build_schedulers(checks, &config, &queues, &controller, &ctx)?;

        for (started_count, route) in routes.iter().enumerate() {
            if let Err(e) = route.forwarder.start().await {
                error!(
                    queue = %route.queue.name(),
                    forwarder = %route.forwarder.name(),
                    error = %e,
                    "Forwarder failed to start"
                );
                for started in &routes[..started_count] {
                    started.forwarder.stop().await;
                }
                release(schedulers);
                return Err(CliError::forwarder_start(route.forwarder.name(), e.to_string()));
            }
        }

        let dispatch_config = DispatcherConfig {
            drop_check_payloads: config.drop_check_payloads.clone(),
            run_real_time,
        };
        let dispatchers: Vec<(JoinHandle<()>, Arc<DispatcherMetrics>)> = routes
            .iter()
            .map(|route| {
                let dispatcher = Dispatcher::new(
                    Arc::clone(&route.queue),
                    Arc::clone(&route.forwarder),
                    Arc::clone(&controller),
                    dispatch_config.clone(),
                );
                let metrics = dispatcher.metrics();
                (dispatcher.spawn(), metrics)
            })
            .collect();

        let handles: Vec<JoinHandle<SchedulerExit>> =
            schedulers.into_iter().map(CheckScheduler::spawn).collect();
        let telemetry_handle = spawn_telemetry(
            Arc::clone(&queues),
            telemetry,
            shutdown_rx,
            AGENT_VERSION.to_string(),
        );

        info!(
            checks = handles.len(),
            dispatchers = dispatchers.len(),
            "Collector started"
        );

        shutdown.await;
        info!("Shutdown requested, stopping collector");

        shutdown_tx.send_replace(true);
        queues.stop_all();

        let exits = join_schedulers(handles).await;
        let dispatch = join_dispatchers(dispatchers).await;
        let checks = cleanup_checks(exits);
        for route in &routes {
            route.forwarder.stop().await;
        }
        if let Err(e) = telemetry_handle.await {
            warn!(error = %e, "Telemetry task failed");
        }

        let state = controller.state();
        let stats = PipelineStats {
            duration: started.elapsed(),
            checks,
            dispatch,
            queues: queues.metrics(),
            real_time_enabled: state.is_enabled(),
            real_time_interval: state.interval(),
            last_collect: last_runs.last_collect_time(),
        };
        info!(
            runs = stats.total_runs(),
            submitted = stats.dispatch.submitted,
            "Collector stopped"
        );
        Ok(stats)
    }
}

fn system_info(config: &AgentConfig) -> SystemInfo {
    SystemInfo {
        hostname: config.hostname.clone(),
        cpu_count: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        agent_version: AGENT_VERSION.to_string(),
    }
}

fn payload_settings(config: &AgentConfig) -> PayloadSettings {
    PayloadSettings {
        hostname: config.hostname.clone(),
        agent_version: AGENT_VERSION.to_string(),
        orchestration_enabled: config.orchestrator.collection_enabled,
        manifest_collection_enabled: config.orchestrator.manifest_collection_enabled,
        cluster_id: config.orchestrator.cluster_id.clone(),
    }
}

/// Init every check; a failing check is skipped for this run
fn init_checks(checks: Vec<RegisteredCheck>, info: &SystemInfo) -> Vec<RegisteredCheck> {
    checks
        .into_iter()
        .filter_map(|mut check| match check.init(info) {
            Ok(()) => Some(check),
            Err(e) => {
                warn!(check = %check.name(), error = %e, "Check failed to initialize, skipping");
                None
            }
        })
        .collect()
}

/// Build one scheduler per check
///
/// On failure every check, including those already wrapped, is cleaned up.
fn build_schedulers(
    checks: Vec<RegisteredCheck>,
    config: &AgentConfig,
    queues: &CollectorQueues,
    controller: &RealTimeController,
    ctx: &SchedulerContext,
) -> Result<Vec<CheckScheduler>> {
    let mut built = Vec::with_capacity(checks.len());
    let mut pending = checks.into_iter();

    while let Some(check) = pending.next() {
        match build_scheduler(check, config, queues, controller, ctx) {
            Ok(scheduler) => built.push(scheduler),
            Err(e) => {
                error!(error = %e, "Failed to build check scheduler");
                release(built);
                for mut check in pending {
                    check.cleanup();
                }
                return Err(e.into());
            }
        }
    }
    Ok(built)
}

fn build_scheduler(
    check: RegisteredCheck,
    config: &AgentConfig,
    queues: &CollectorQueues,
    controller: &RealTimeController,
    ctx: &SchedulerContext,
) -> std::result::Result<CheckScheduler, SchedulerError> {
    let name = check.name().to_string();
    let results = queues.for_check(&name);
    // Dual-mode checks start at their real-time name's interval, real-time-only
    // checks at their own; later values come from the controller.
    let real_time_interval =
        config.check_interval(check.real_time_name().unwrap_or(name.as_str()));

    match check {
        check @ RegisteredCheck::WithRealTime(_) if ctx.run_real_time => {
            CheckScheduler::with_real_time(
                check,
                config.check_interval(&name),
                real_time_interval,
                results,
                Arc::clone(&queues.rt_process),
                ctx.clone(),
                controller.subscribe(),
            )
        }
        check => {
            let interval = if check.real_time() {
                real_time_interval
            } else {
                config.check_interval(&name)
            };
            CheckScheduler::basic(check, interval, results, ctx.clone(), controller.subscribe())
        }
    }
}

/// Clean up checks of schedulers that never ran
fn release(schedulers: Vec<CheckScheduler>) {
    for mut check in schedulers.into_iter().filter_map(CheckScheduler::into_check) {
        check.cleanup();
    }
}

/// Wait for every scheduler to hand back its check
async fn join_schedulers(handles: Vec<JoinHandle<SchedulerExit>>) -> Vec<SchedulerExit> {
    let mut exits = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(exit) => exits.push(exit),
            Err(e) => error!(error = %e, "Scheduler task failed"),
        }
    }
    exits
}

/// Clean up each returned check once
///
/// Must only run after every scheduler and dispatcher has exited.
fn cleanup_checks(exits: Vec<SchedulerExit>) -> Vec<CheckSummary> {
    exits
        .into_iter()
        .map(|exit| {
            match exit.check {
                Some(mut check) => check.cleanup(),
                None => warn!(check = %exit.name, "Check lost to a panicking run, no cleanup"),
            }
            CheckSummary {
                name: exit.name,
                stats: exit.stats,
            }
        })
        .collect()
}

async fn join_dispatchers(
    dispatchers: Vec<(JoinHandle<()>, Arc<DispatcherMetrics>)>,
) -> MetricsSnapshot {
    let mut total = MetricsSnapshot::default();
    for (handle, metrics) in dispatchers {
        if let Err(e) = handle.await {
            error!(error = %e, "Dispatcher task failed");
        }
        total = total.merge(metrics.snapshot());
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{
        BoxedMessage, Check, CheckSpec, ContractError, Endpoint, ForwarderConfig,
        PayloadHeaders, ResponseStream,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Records submissions, answers nothing
    #[derive(Default)]
    struct SilentForwarder {
        fail_start: bool,
        starts: AtomicUsize,
        stops: AtomicUsize,
        submitted: Mutex<Vec<Endpoint>>,
    }

    impl Forwarder for SilentForwarder {
        fn name(&self) -> &str {
            "silent"
        }

        async fn start(&self) -> std::result::Result<(), ContractError> {
            if self.fail_start {
                return Err(ContractError::forwarder_start("silent", "refused"));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn submit(
            &self,
            endpoint: Endpoint,
            _body: Bytes,
            _headers: &PayloadHeaders,
        ) -> std::result::Result<ResponseStream, ContractError> {
            self.submitted.lock().unwrap().push(endpoint);
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Holds every submission for `delay`, then notes the cleanups seen so far
    struct SlowForwarder {
        delay: Duration,
        cleanups: Arc<AtomicUsize>,
        cleanups_seen: Arc<Mutex<Vec<usize>>>,
    }

    impl Forwarder for SlowForwarder {
        fn name(&self) -> &str {
            "slow"
        }

        async fn start(&self) -> std::result::Result<(), ContractError> {
            Ok(())
        }

        async fn submit(
            &self,
            _endpoint: Endpoint,
            _body: Bytes,
            _headers: &PayloadHeaders,
        ) -> std::result::Result<ResponseStream, ContractError> {
            tokio::time::sleep(self.delay).await;
            self.cleanups_seen
                .lock()
                .unwrap()
                .push(self.cleanups.load(Ordering::SeqCst));
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn stop(&self) {}
    }

    /// Counts cleanups; init may be told to fail
    struct CountingCheck {
        name: &'static str,
        fail_init: bool,
        messages: usize,
        cleanups: Arc<AtomicUsize>,
    }

    impl Check for CountingCheck {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&mut self, _info: &SystemInfo) -> std::result::Result<(), ContractError> {
            if self.fail_init {
                return Err(ContractError::check_init(self.name, "no access"));
            }
            Ok(())
        }

        fn run(&mut self, group_id: i32) -> std::result::Result<Vec<BoxedMessage>, ContractError> {
            Ok((0..self.messages)
                .map(|_| Box::new(checks::SyntheticMessage::new(group_id, 16)) as BoxedMessage)
                .collect())
        }

        fn cleanup(&mut self) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(name: &'static str, fail_init: bool, cleanups: &Arc<AtomicUsize>) -> RegisteredCheck {
        RegisteredCheck::basic(CountingCheck {
            name,
            fail_init,
            messages: 0,
            cleanups: Arc::clone(cleanups),
        })
    }

    fn run_count(stats: &PipelineStats, name: &str) -> u64 {
        stats
            .checks
            .iter()
            .find(|c| c.name == name)
            .map_or(0, |c| c.stats.runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cleans_up_each_check_once() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let checks = vec![
            counting("process", false, &cleanups),
            counting("connections", false, &cleanups),
            counting("process_discovery", true, &cleanups),
        ];
        let collector =
            Collector::new(AgentConfig::default(), checks, |_| Ok(SilentForwarder::default()))
                .unwrap();

        let stats = collector
            .run(tokio::time::sleep(Duration::from_secs(25)))
            .await
            .unwrap();

        // the check that failed init never got a scheduler
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
        assert_eq!(stats.checks.len(), 2);
        assert!(stats.total_runs() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_waits_for_dispatchers() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let cleanups_seen = Arc::new(Mutex::new(Vec::new()));
        let checks = vec![RegisteredCheck::basic(CountingCheck {
            name: "process",
            fail_init: false,
            messages: 1,
            cleanups: Arc::clone(&cleanups),
        })];
        let collector = Collector::new(AgentConfig::default(), checks, |_| {
            Ok(SlowForwarder {
                delay: Duration::from_secs(5),
                cleanups: Arc::clone(&cleanups),
                cleanups_seen: Arc::clone(&cleanups_seen),
            })
        })
        .unwrap();

        // shutdown lands while the priming payload is still being submitted
        collector
            .run(tokio::time::sleep(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(*cleanups_seen.lock().unwrap(), vec![0]);
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_configured_real_time_interval_above_standard_is_fatal() {
        let mut config = AgentConfig::default();
        config.check_intervals.insert("process".into(), 10);
        config.check_intervals.insert("rtprocess".into(), 20);
        let checks = checks::build_checks(&[CheckSpec::named("process")]);
        let collector =
            Collector::new(config, checks, |_| Ok(SilentForwarder::default())).unwrap();

        let err = collector.run(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, CliError::Scheduler(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dual_mode_uses_configured_real_time_interval() {
        let mut config = AgentConfig::default();
        config.check_intervals.insert("process".into(), 9);
        config.check_intervals.insert("rtprocess".into(), 3);
        let checks = checks::build_checks(&[CheckSpec::named("process")]);
        let collector =
            Collector::new(config, checks, |_| Ok(SilentForwarder::default())).unwrap();

        let stats = collector
            .run(tokio::time::sleep(Duration::from_millis(17_500)))
            .await
            .unwrap();

        // ticks every 3s, standard half every third tick: priming run plus t=9s
        assert!(!stats.real_time_enabled);
        assert_eq!(run_count(&stats, "process"), 2);
    }

    #[tokio::test]
    async fn test_forwarder_start_failure_is_fatal() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let checks = vec![counting("process", false, &cleanups)];
        let collector = Collector::new(AgentConfig::default(), checks, |_| {
            Ok(SilentForwarder {
                fail_start: true,
                ..Default::default()
            })
        })
        .unwrap();

        let err = collector.run(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, CliError::ForwarderStart { .. }));
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_interval_is_fatal() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let mut config = AgentConfig::default();
        config.check_intervals.insert("connections".into(), 0);
        let checks = vec![
            counting("process", false, &cleanups),
            counting("connections", false, &cleanups),
            counting("process_events", false, &cleanups),
        ];
        let collector =
            Collector::new(config, checks, |_| Ok(SilentForwarder::default())).unwrap();

        let err = collector.run(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, CliError::Scheduler(_)));
        // the rejected check is consumed by the failed constructor
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_forwarder_factory_sees_queue_names() {
        let mut names = Vec::new();
        Collector::new(AgentConfig::default(), Vec::new(), |name| {
            names.push(name.to_string());
            Ok(SilentForwarder::default())
        })
        .unwrap();
        assert_eq!(names, ["process", "rtprocess", "connections", "pod", "events"]);
    }

    #[test]
    fn test_forwarder_factory_error_propagates() {
        let result = Collector::<dispatcher::ConfiguredForwarder>::new(
            AgentConfig::default(),
            checks::build_checks(&[CheckSpec::named("process")]),
            |name| dispatcher::create_forwarder(name, &file_forwarder_without_path()),
        );
        assert!(matches!(result, Err(CliError::Dispatcher(_))));
    }

    fn file_forwarder_without_path() -> ForwarderConfig {
        ForwarderConfig {
            kind: contracts::ForwarderKind::File,
            ..Default::default()
        }
    }
}
