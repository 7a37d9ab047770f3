//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use contracts::AgentConfig;
use dispatcher::create_forwarder;
use process_agent_cli::{CliError, Collector, QueueLimits};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_collector(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(ref hostname) = args.hostname {
        info!(hostname = %hostname, "Overriding hostname from CLI");
        config.hostname = hostname.clone();
    }

    info!(
        hostname = %config.hostname,
        checks = config.checks.len(),
        forwarder = ?config.forwarder.kind,
        real_time = config.run_real_time(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let metrics_port = args
        .metrics_port
        .or(config.telemetry.metrics_port)
        .filter(|port| *port != 0);
    if let Some(port) = metrics_port {
        observability::init_metrics_only(port)?;
    }

    let checks = checks::build_checks(&config.checks);
    let forwarder_config = config.forwarder.clone();
    let collector = Collector::new(config, checks, |queue| {
        create_forwarder(queue, &forwarder_config)
    })
    .context("Failed to create collector")?;

    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));

    info!("Starting collector...");
    let stats = collector
        .run(shutdown_signal(timeout))
        .await
        .context("Collector execution failed")?;

    info!(
        runs = stats.total_runs(),
        failures = stats.total_failures(),
        submitted = stats.dispatch.submitted,
        duration_secs = stats.duration.as_secs_f64(),
        "Collector finished"
    );
    stats.print_summary();

    Ok(())
}

/// Resolves on Ctrl+C, SIGTERM or when `timeout` elapses
async fn shutdown_signal(timeout: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
        _ = deadline => info!("Timeout reached"),
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &AgentConfig) {
    let limits = QueueLimits::from_config(config);

    println!("\n=== Configuration Summary ===\n");
    println!("Host: {}", config.hostname);
    println!(
        "Real-time checks: {}",
        if config.run_real_time() { "enabled" } else { "disabled" }
    );
    println!(
        "Queues: size={} rt_size={} bytes={} pod_bytes={}",
        limits.queue_size, limits.rt_queue_size, limits.queue_bytes, limits.pod_queue_bytes
    );

    println!("\nChecks ({}):", config.checks.len());
    for check in &config.checks {
        println!(
            "  - {} every {}s",
            check.name,
            config.check_interval(&check.name).as_secs()
        );
    }

    if !config.drop_check_payloads.is_empty() {
        println!("\nDropped payloads: {:?}", config.drop_check_payloads);
    }

    println!("\nForwarder: {:?}", config.forwarder.kind);
    println!();
}
