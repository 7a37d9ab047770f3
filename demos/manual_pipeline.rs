//! Manual Pipeline Example
//!
//! Wires one dual-mode `process` check, its two queues, a dispatcher per
//! queue and the real-time controller by hand, without `Collector`.
//! The LogForwarder reports one watching client, so real-time output
//! starts after the first standard payload is answered.
//!
//! Run with: cargo run -p collector_demos --bin manual_pipeline

use std::sync::Arc;
use std::time::Duration;

use checks::SyntheticRealTimeCheck;
use contracts::{
    check_names, CheckSpec, CollectorStatus, Forwarder, GroupIdGenerator, RegisteredCheck,
    SystemInfo,
};
use dispatcher::forwarders::LogForwarderConfig;
use dispatcher::{Dispatcher, DispatcherConfig, LogForwarder};
use realtime::{RealTimeController, DEFAULT_REAL_TIME_INTERVAL};
use scheduler::{CheckScheduler, LastRunStore, PayloadSettings, ResultBuilder, SchedulerContext};
use tokio::sync::watch;
use weighted_queue::WeightedQueue;

const HOSTNAME: &str = "demo-host";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Manual Pipeline Demo");

    // ==== Stage 1: Queues and shared state ====
    let process_queue = Arc::new(WeightedQueue::new("process", 256, 60_000_000));
    let rt_queue = Arc::new(WeightedQueue::new("rtprocess", 5, 60_000_000));
    let controller = Arc::new(RealTimeController::new(DEFAULT_REAL_TIME_INTERVAL));
    let last_runs = Arc::new(LastRunStore::new());

    // ==== Stage 2: Forwarder ====
    let forwarder = Arc::new(LogForwarder::new(
        "log",
        LogForwarderConfig {
            status: CollectorStatus {
                active_clients: 1,
                interval: 1,
            },
            ..Default::default()
        },
    ));
    forwarder.start().await?;

    // ==== Stage 3: One dispatcher per queue ====
    let dispatchers: Vec<_> = [&process_queue, &rt_queue]
        .into_iter()
        .map(|queue| {
            Dispatcher::new(
                Arc::clone(queue),
                Arc::clone(&forwarder),
                Arc::clone(&controller),
                DispatcherConfig {
                    drop_check_payloads: Vec::new(),
                    run_real_time: true,
                },
            )
            .spawn()
        })
        .collect();

    // ==== Stage 4: Scheduler ====
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctx = SchedulerContext {
        builder: Arc::new(ResultBuilder::new(PayloadSettings {
            hostname: HOSTNAME.to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        })),
        group_ids: GroupIdGenerator::new(0),
        real_time: controller.state(),
        run_real_time: true,
        last_runs: Arc::clone(&last_runs),
        shutdown: shutdown_rx,
    };

    let mut check = RegisteredCheck::with_real_time(SyntheticRealTimeCheck::new(
        CheckSpec::named(check_names::PROCESS),
        check_names::RT_PROCESS,
    ));
    check.init(&SystemInfo {
        hostname: HOSTNAME.to_string(),
        ..Default::default()
    })?;

    let scheduler = CheckScheduler::with_real_time(
        check,
        Duration::from_secs(4),
        controller.state().interval(),
        Arc::clone(&process_queue),
        Arc::clone(&rt_queue),
        ctx,
        controller.subscribe(),
    )?;
    let handle = scheduler.spawn();

    // ==== Stage 5: Run, then shut down in order ====
    tokio::time::sleep(Duration::from_secs(6)).await;

    shutdown_tx.send_replace(true);
    process_queue.stop();
    rt_queue.stop();

    let exit = handle.await?;
    if let Some(mut check) = exit.check {
        check.cleanup();
    }
    for dispatcher in dispatchers {
        dispatcher.await?;
    }
    forwarder.stop().await;

    // ==== Stage 6: Results ====
    let state = controller.state();
    println!("\n=== Manual Pipeline Results ===");
    println!("Check runs: {}", exit.stats.runs);
    println!("Results queued: {}", exit.stats.results_queued);
    println!("Payloads forwarded: {}", forwarder.submitted());
    println!(
        "Real-time: {} (interval {:?}, clients {})",
        state.is_enabled(),
        state.interval(),
        state.active_clients()
    );
    if let Some(run) = last_runs.get(check_names::RT_PROCESS) {
        println!("Last real-time run: {} ({} messages)", run.at, run.messages);
    }

    Ok(())
}
