//! Per-check scheduler task

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use contracts::{CheckResult, GroupIdGenerator, RegisteredCheck, RunOptions};
use observability::CheckRunStats;
use realtime::RealTimeState;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use weighted_queue::WeightedQueue;

use crate::last_run::LastRunStore;
use crate::results::ResultBuilder;
use crate::run_counter::{log_check_duration, RunCounter};
use crate::SchedulerError;

/// Shared collaborators of every scheduler in a collector
#[derive(Clone)]
pub struct SchedulerContext {
    pub builder: Arc<ResultBuilder>,
    pub group_ids: GroupIdGenerator,
    pub real_time: Arc<RealTimeState>,
    /// Real-time mode allowed at all
    pub run_real_time: bool,
    pub last_runs: Arc<LastRunStore>,
    /// Flips to `true` once; a dropped sender also stops the scheduler
    pub shutdown: watch::Receiver<bool>,
}

/// What a scheduler hands back when it exits
///
/// `check` is `None` only if a run panicked and took the check with it.
#[derive(Debug)]
pub struct SchedulerExit {
    pub name: String,
    pub check: Option<RegisteredCheck>,
    pub stats: CheckRunStats,
}

#[derive(Debug, Clone, Copy)]
enum Cadence {
    /// Single-mode: one interval, real-time checks follow live updates
    Basic { interval: Duration },
    /// Dual-mode: ticks at the real-time interval
    DualMode { standard: Duration, real_time: Duration },
}

/// Owns one check and drives it until shutdown
pub struct CheckScheduler {
    name: String,
    check: Option<RegisteredCheck>,
    cadence: Cadence,
    results: Arc<WeightedQueue<CheckResult>>,
    rt_results: Option<Arc<WeightedQueue<CheckResult>>>,
    ctx: SchedulerContext,
    interval_rx: watch::Receiver<Duration>,
    runs: RunCounter,
    stats: CheckRunStats,
}

impl CheckScheduler {
    /// Scheduler running `check` every `interval`
    ///
    /// For a real-time-only check `interval` is the starting real-time
    /// interval; later values arrive through `interval_rx`.
    pub fn basic(
        check: RegisteredCheck,
        interval: Duration,
        results: Arc<WeightedQueue<CheckResult>>,
        ctx: SchedulerContext,
        interval_rx: watch::Receiver<Duration>,
    ) -> Result<Self, SchedulerError> {
        let name = check.name().to_string();
        if interval.is_zero() {
            return Err(SchedulerError::invalid_interval(name, "interval must be positive"));
        }
        Ok(Self::build(name, check, Cadence::Basic { interval }, results, None, ctx, interval_rx))
    }

    /// Dual-mode scheduler producing standard and real-time output
    ///
    /// The standard half runs on every `standard / real_time` tick.
    pub fn with_real_time(
        check: RegisteredCheck,
        standard: Duration,
        real_time: Duration,
        results: Arc<WeightedQueue<CheckResult>>,
        rt_results: Arc<WeightedQueue<CheckResult>>,
        ctx: SchedulerContext,
        interval_rx: watch::Receiver<Duration>,
    ) -> Result<Self, SchedulerError> {
        let name = check.name().to_string();
        if real_time.is_zero() {
            return Err(SchedulerError::invalid_interval(
                name,
                "real-time interval must be positive",
            ));
        }
        if real_time > standard {
            return Err(SchedulerError::invalid_interval(
                name,
                format!(
                    "real-time interval {:?} must not exceed standard interval {:?}",
                    real_time, standard
                ),
            ));
        }
        Ok(Self::build(
            name,
            check,
            Cadence::DualMode { standard, real_time },
            results,
            Some(rt_results),
            ctx,
            interval_rx,
        ))
    }

    fn build(
        name: String,
        check: RegisteredCheck,
        cadence: Cadence,
        results: Arc<WeightedQueue<CheckResult>>,
        rt_results: Option<Arc<WeightedQueue<CheckResult>>>,
        ctx: SchedulerContext,
        interval_rx: watch::Receiver<Duration>,
    ) -> Self {
        Self {
            name,
            check: Some(check),
            cadence,
            results,
            rt_results,
            ctx,
            interval_rx,
            runs: RunCounter::new(),
            stats: CheckRunStats::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Give the check back without ever running it
    pub fn into_check(self) -> Option<RegisteredCheck> {
        self.check
    }

    /// Spawn the scheduler loop
    pub fn spawn(self) -> JoinHandle<SchedulerExit> {
        tokio::spawn(self.run())
    }

    #[instrument(name = "check_scheduler", skip(self), fields(check = %self.name))]
    async fn run(mut self) -> SchedulerExit {
        match self.cadence {
            Cadence::Basic { interval } => self.run_basic_loop(interval).await,
            Cadence::DualMode { standard, real_time } => {
                self.run_dual_mode_loop(standard, real_time).await
            }
        }
        debug!(check = %self.name, "Scheduler exiting");
        SchedulerExit {
            name: self.name,
            check: self.check,
            stats: self.stats,
        }
    }

    async fn run_basic_loop(&mut self, interval: Duration) {
        let is_real_time = self.check.as_ref().is_some_and(RegisteredCheck::real_time);
        let mut shutdown = self.ctx.shutdown.clone();
        let mut interval_rx = self.interval_rx.clone();
        let mut updates_open = true;

        // Real-time-only checks are not primed; the mode may be off.
        if !is_real_time && !self.run_basic().await {
            return;
        }

        let mut ticker = new_ticker(interval);
        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => break,
                _ = ticker.tick() => {
                    if is_real_time && !self.real_time_active() {
                        continue;
                    }
                    if !self.run_basic().await {
                        break;
                    }
                }
                changed = interval_rx.changed(), if updates_open => {
                    if changed.is_err() {
                        updates_open = false;
                        continue;
                    }
                    let next = *interval_rx.borrow_and_update();
                    if is_real_time && !next.is_zero() {
                        debug!(check = %self.name, interval = ?next, "Real-time interval updated");
                        ticker = new_ticker(next);
                    }
                }
            }
        }
    }

    async fn run_dual_mode_loop(&mut self, standard: Duration, real_time: Duration) {
        let mut shutdown = self.ctx.shutdown.clone();
        let mut interval_rx = self.interval_rx.clone();
        let mut updates_open = true;

        let priming = RunOptions {
            run_standard: true,
            run_real_time: false,
        };
        if !self.run_with_real_time(priming).await {
            return;
        }

        let mut current = real_time;
        let mut ratio = ticks_per_standard(&self.name, standard, current);
        let mut ticker = new_ticker(current);
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => break,
                _ = ticker.tick() => {
                    tick += 1;
                    let options = RunOptions {
                        run_standard: tick % ratio == 0,
                        run_real_time: self.real_time_active(),
                    };
                    if !options.run_standard && !options.run_real_time {
                        continue;
                    }
                    if !self.run_with_real_time(options).await {
                        break;
                    }
                }
                changed = interval_rx.changed(), if updates_open => {
                    if changed.is_err() {
                        updates_open = false;
                        continue;
                    }
                    let next = *interval_rx.borrow_and_update();
                    if next.is_zero() || next == current {
                        continue;
                    }
                    info!(check = %self.name, from = ?current, to = ?next, "Real-time interval changed");
                    current = next;
                    ratio = ticks_per_standard(&self.name, standard, current);
                    tick = 0;
                    ticker = new_ticker(current);
                }
            }
        }
    }

    fn real_time_active(&self) -> bool {
        self.ctx.run_real_time && self.ctx.real_time.is_enabled()
    }

    /// One single-mode run. Returns `false` if the check was lost.
    async fn run_basic(&mut self) -> bool {
        let run = self.runs.next_run();
        let started = Instant::now();
        let start = Utc::now();
        self.ctx.last_runs.set_last_collect_time(start);

        let group_id = self.ctx.group_ids.next_id();
        let Some(outcome) = self.invoke(move |check| check.run(group_id)).await else {
            return false;
        };
        let elapsed = started.elapsed();

        let messages = match outcome {
            Ok(messages) => messages,
            Err(e) => {
                error!(check = %self.name, error = %e, "Unable to run check");
                self.stats.record_failure();
                observability::record_check_run(&self.name, elapsed, false);
                return true;
            }
        };
        self.stats.record_success(elapsed);
        observability::record_check_run(&self.name, elapsed, true);

        let keep = self
            .check
            .as_ref()
            .is_some_and(RegisteredCheck::should_save_last_run);
        self.ctx
            .last_runs
            .store(&self.name, start, keep.then_some(messages.as_slice()));

        let results = self.ctx.builder.build(start, &self.name, messages);
        let queue = Arc::clone(&self.results);
        self.enqueue(&queue, results);

        if !self.check.as_ref().is_some_and(RegisteredCheck::real_time) {
            log_check_duration(&self.name, elapsed, run);
        }
        true
    }

    /// One dual-mode run. Returns `false` if the check was lost.
    async fn run_with_real_time(&mut self, options: RunOptions) -> bool {
        let started = Instant::now();
        let start = Utc::now();
        self.ctx.last_runs.set_last_collect_time(start);

        let group_ids = self.ctx.group_ids.clone();
        let Some(outcome) = self
            .invoke(move |check| check.run_with_options(&group_ids, options))
            .await
        else {
            return false;
        };
        let elapsed = started.elapsed();

        let run = match outcome {
            Ok(run) => run,
            Err(e) => {
                error!(check = %self.name, error = %e, "Unable to run check");
                self.stats.record_failure();
                observability::record_check_run(&self.name, elapsed, false);
                return true;
            }
        };
        self.stats.record_success(elapsed);
        observability::record_check_run(&self.name, elapsed, true);

        let real_time_name = self
            .check
            .as_ref()
            .and_then(RegisteredCheck::real_time_name)
            .unwrap_or(&self.name)
            .to_string();

        if options.run_standard {
            // Only standard runs count toward the duration log cadence.
            let count = self.runs.next_run();
            self.ctx.last_runs.store(&self.name, start, Some(run.standard.as_slice()));
            log_check_duration(&self.name, elapsed, count);
        }
        let standard = self.ctx.builder.build(start, &self.name, run.standard);
        let queue = Arc::clone(&self.results);
        self.enqueue(&queue, standard);

        if options.run_real_time {
            self.ctx.last_runs.store(&real_time_name, start, Some(run.real_time.as_slice()));
        }
        let real_time = self.ctx.builder.build(start, &real_time_name, run.real_time);
        let rt_queue = self.rt_results.clone().unwrap_or_else(|| self.results.clone());
        self.enqueue(&rt_queue, real_time);
        true
    }

    fn enqueue(&mut self, queue: &WeightedQueue<CheckResult>, results: Vec<CheckResult>) {
        for result in results {
            observability::record_result_queued(
                result.name(),
                result.payloads().len(),
                result.size_in_bytes(),
            );
            self.stats.record_queued();
            queue.add(result);
        }
    }

    /// Run `f` against the check on the blocking pool
    ///
    /// The check moves into the blocking task and back. A panic loses the
    /// check and ends this scheduler only.
    async fn invoke<R, F>(&mut self, f: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut RegisteredCheck) -> R + Send + 'static,
    {
        let mut check = self.check.take()?;
        let joined = tokio::task::spawn_blocking(move || {
            let out = f(&mut check);
            (check, out)
        })
        .await;

        match joined {
            Ok((check, out)) => {
                self.check = Some(check);
                Some(out)
            }
            Err(e) => {
                error!(check = %self.name, error = %e, "Check run panicked, stopping its scheduler");
                None
            }
        }
    }
}

/// Resolves once shutdown is requested or the sender is gone
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Ticker whose first tick lands one period from now
fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Real-time ticks per standard run (at least one)
fn ticks_per_standard(name: &str, standard: Duration, real_time: Duration) -> u64 {
    let rt_ms = real_time.as_millis().max(1);
    let std_ms = standard.as_millis();
    if std_ms % rt_ms != 0 {
        warn!(
            check = %name,
            standard = ?standard,
            real_time = ?real_time,
            "Standard interval is not a multiple of the real-time interval, rounding down"
        );
    }
    u64::try_from(std_ms / rt_ms).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::PayloadSettings;
    use contracts::{
        BoxedMessage, Check, CheckWithRealTime, CollectorStatus, ContractError, MessageBody,
        RunResult, SystemInfo,
    };
    use realtime::RealTimeController;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Blob;

    impl MessageBody for Blob {
        fn encode(&self) -> Result<Vec<u8>, ContractError> {
            Ok(vec![1u8; 16])
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Behavior {
        Ok,
        Fail,
        Panic,
    }

    struct CountingCheck {
        name: &'static str,
        real_time: bool,
        behavior: Behavior,
        runs: Arc<AtomicUsize>,
        cleaned: Arc<AtomicBool>,
    }

    impl CountingCheck {
        fn new(name: &'static str, real_time: bool, behavior: Behavior) -> Self {
            Self {
                name,
                real_time,
                behavior,
                runs: Arc::new(AtomicUsize::new(0)),
                cleaned: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl Check for CountingCheck {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&mut self, _info: &SystemInfo) -> Result<(), ContractError> {
            Ok(())
        }

        fn run(&mut self, _group_id: i32) -> Result<Vec<BoxedMessage>, ContractError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Ok => Ok(vec![Box::new(Blob)]),
                Behavior::Fail => Err(ContractError::check_run(self.name, "collection failed")),
                Behavior::Panic => panic!("check exploded"),
            }
        }

        fn real_time(&self) -> bool {
            self.real_time
        }

        fn cleanup(&mut self) {
            self.cleaned.store(true, Ordering::SeqCst);
        }
    }

    struct DualCheck {
        calls: Arc<Mutex<Vec<RunOptions>>>,
    }

    impl Check for DualCheck {
        fn name(&self) -> &str {
            "process"
        }

        fn init(&mut self, _info: &SystemInfo) -> Result<(), ContractError> {
            Ok(())
        }

        fn run(&mut self, _group_id: i32) -> Result<Vec<BoxedMessage>, ContractError> {
            Ok(vec![Box::new(Blob)])
        }
    }

    impl CheckWithRealTime for DualCheck {
        fn real_time_name(&self) -> &str {
            "rtprocess"
        }

        fn run_with_options(
            &mut self,
            _group_ids: &GroupIdGenerator,
            options: RunOptions,
        ) -> Result<RunResult, ContractError> {
            self.calls.lock().unwrap().push(options);
            let mut result = RunResult::default();
            if options.run_standard {
                result.standard.push(Box::new(Blob));
            }
            if options.run_real_time {
                result.real_time.push(Box::new(Blob));
            }
            Ok(result)
        }
    }

    struct Harness {
        controller: RealTimeController,
        shutdown: watch::Sender<bool>,
        results: Arc<WeightedQueue<CheckResult>>,
        rt_results: Arc<WeightedQueue<CheckResult>>,
        ctx: SchedulerContext,
    }

    impl Harness {
        fn new() -> Self {
            let controller = RealTimeController::new(Duration::from_secs(2));
            let (shutdown, shutdown_rx) = watch::channel(false);
            let ctx = SchedulerContext {
                builder: Arc::new(ResultBuilder::new(PayloadSettings::default())),
                group_ids: GroupIdGenerator::new(0),
                real_time: controller.state(),
                run_real_time: true,
                last_runs: Arc::new(LastRunStore::new()),
                shutdown: shutdown_rx,
            };
            Self {
                controller,
                shutdown,
                results: Arc::new(WeightedQueue::new("process", 100, u64::MAX)),
                rt_results: Arc::new(WeightedQueue::new("rtprocess", 100, u64::MAX)),
                ctx,
            }
        }

        fn basic(&self, check: CountingCheck, interval: Duration) -> CheckScheduler {
            CheckScheduler::basic(
                RegisteredCheck::basic(check),
                interval,
                self.results.clone(),
                self.ctx.clone(),
                self.controller.subscribe(),
            )
            .unwrap()
        }

        fn enable_real_time(&self, interval_secs: i32) {
            self.controller.update(&[CollectorStatus {
                active_clients: 1,
                interval: interval_secs,
            }]);
        }

        async fn stop(&self, handle: JoinHandle<SchedulerExit>) -> SchedulerExit {
            self.shutdown.send_replace(true);
            handle.await.unwrap()
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[tokio::test(start_paused = true)]
    async fn test_basic_check_primed_then_ticks() {
        let h = Harness::new();
        let check = CountingCheck::new("connections", false, Behavior::Ok);
        let runs = check.runs.clone();
        let handle = h.basic(check, secs(10.0)).spawn();

        tokio::time::sleep(secs(1.0)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(secs(24.0)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(h.results.len(), 3);

        let exit = h.stop(handle).await;
        assert_eq!(exit.name, "connections");
        assert_eq!(exit.stats.runs, 3);
        assert!(exit.check.is_some());
        assert!(h.ctx.last_runs.get("connections").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_real_time_check_waits_for_real_time_mode() {
        let h = Harness::new();
        let check = CountingCheck::new("rtcontainer", true, Behavior::Ok);
        let runs = check.runs.clone();
        let handle = h.basic(check, secs(2.0)).spawn();

        tokio::time::sleep(secs(11.0)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        h.enable_real_time(2);
        tokio::time::sleep(secs(5.5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        h.stop(handle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_update_replaces_timer() {
        let h = Harness::new();
        h.enable_real_time(2);
        let check = CountingCheck::new("rtcontainer", true, Behavior::Ok);
        let runs = check.runs.clone();
        let handle = h.basic(check, secs(2.0)).spawn();

        tokio::time::sleep(secs(4.5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        h.enable_real_time(5);
        tokio::time::sleep(secs(4.5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        tokio::time::sleep(secs(1.0)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        h.stop(handle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_the_loop() {
        let h = Harness::new();
        let check = CountingCheck::new("connections", false, Behavior::Fail);
        let runs = check.runs.clone();
        let handle = h.basic(check, secs(10.0)).spawn();

        tokio::time::sleep(secs(25.0)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(h.results.is_empty());

        let exit = h.stop(handle).await;
        assert_eq!(exit.stats.failures, 3);
        assert_eq!(exit.stats.runs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_check_without_cleanup() {
        let h = Harness::new();
        let check = CountingCheck::new("process_discovery", false, Behavior::Ok);
        let cleaned = check.cleaned.clone();
        let handle = h.basic(check, secs(10.0)).spawn();

        tokio::time::sleep(secs(1.0)).await;
        let exit = h.stop(handle).await;
        assert!(!cleaned.load(Ordering::SeqCst));

        let mut check = exit.check.unwrap();
        check.cleanup();
        assert!(cleaned.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_check_ends_only_its_scheduler() {
        let h = Harness::new();
        let bad = h.basic(CountingCheck::new("pod", false, Behavior::Panic), secs(10.0)).spawn();
        let good_check = CountingCheck::new("connections", false, Behavior::Ok);
        let good_runs = good_check.runs.clone();
        let good = h.basic(good_check, secs(10.0)).spawn();

        let exit = bad.await.unwrap();
        assert!(exit.check.is_none());

        tokio::time::sleep(secs(15.0)).await;
        assert_eq!(good_runs.load(Ordering::SeqCst), 2);
        h.stop(good).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dual_mode_standard_ratio() {
        let h = Harness::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let scheduler = CheckScheduler::with_real_time(
            RegisteredCheck::with_real_time(DualCheck {
                calls: calls.clone(),
            }),
            secs(10.0),
            secs(2.0),
            h.results.clone(),
            h.rt_results.clone(),
            h.ctx.clone(),
            h.controller.subscribe(),
        )
        .unwrap();
        let handle = scheduler.spawn();

        tokio::time::sleep(secs(11.0)).await;
        let standard_only = RunOptions {
            run_standard: true,
            run_real_time: false,
        };
        assert_eq!(*calls.lock().unwrap(), vec![standard_only, standard_only]);
        assert_eq!(h.results.len(), 2);
        assert!(h.rt_results.is_empty());

        h.enable_real_time(2);
        tokio::time::sleep(secs(4.0)).await;
        assert_eq!(calls.lock().unwrap().len(), 4);
        assert_eq!(h.rt_results.len(), 2);
        assert!(h.ctx.last_runs.get("rtprocess").is_some());

        h.stop(handle).await;
    }

    #[test]
    fn test_invalid_intervals_rejected() {
        let h = Harness::new();
        let zero = CheckScheduler::basic(
            RegisteredCheck::basic(CountingCheck::new("connections", false, Behavior::Ok)),
            Duration::ZERO,
            h.results.clone(),
            h.ctx.clone(),
            h.controller.subscribe(),
        );
        assert!(matches!(zero, Err(SchedulerError::InvalidInterval { .. })));

        let inverted = CheckScheduler::with_real_time(
            RegisteredCheck::with_real_time(DualCheck {
                calls: Arc::new(Mutex::new(Vec::new())),
            }),
            secs(1.0),
            secs(2.0),
            h.results.clone(),
            h.rt_results.clone(),
            h.ctx.clone(),
            h.controller.subscribe(),
        );
        assert!(inverted.is_err());
    }

    #[test]
    fn test_ticks_per_standard() {
        assert_eq!(ticks_per_standard("p", Duration::from_secs(10), Duration::from_secs(2)), 5);
        assert_eq!(ticks_per_standard("p", Duration::from_secs(10), Duration::from_secs(3)), 3);
        assert_eq!(ticks_per_standard("p", Duration::from_secs(1), Duration::from_secs(2)), 1);
    }
}
