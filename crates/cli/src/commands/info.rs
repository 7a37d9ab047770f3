//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::AgentConfig;
use process_agent_cli::{CliError, CollectorQueues, QueueLimits};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    hostname: String,
    real_time: bool,
    queues: Vec<QueueInfo>,
    checks: Vec<CheckInfo>,
    forwarder: ForwarderInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    drop_check_payloads: Vec<String>,
}

#[derive(Serialize)]
struct QueueInfo {
    name: String,
    max_items: usize,
    max_bytes: u64,
}

#[derive(Serialize)]
struct CheckInfo {
    name: String,
    interval_secs: u64,
    queue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    real_time_name: Option<String>,
}

#[derive(Serialize)]
struct ForwarderInfo {
    kind: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &AgentConfig) -> ConfigInfo {
    let queues = CollectorQueues::new(QueueLimits::from_config(config));
    let registered = checks::build_checks(&config.checks);

    ConfigInfo {
        hostname: config.hostname.clone(),
        real_time: config.run_real_time(),
        queues: queues
            .all()
            .iter()
            .map(|q| QueueInfo {
                name: q.name().to_string(),
                max_items: q.max_size(),
                max_bytes: q.max_weight(),
            })
            .collect(),
        checks: registered
            .iter()
            .map(|check| CheckInfo {
                name: check.name().to_string(),
                interval_secs: config.check_interval(check.name()).as_secs(),
                queue: queues.for_check(check.name()).name().to_string(),
                real_time_name: check.real_time_name().map(str::to_string),
            })
            .collect(),
        forwarder: ForwarderInfo {
            kind: format!("{:?}", config.forwarder.kind),
            params: config.forwarder.params.clone(),
        },
        drop_check_payloads: config.drop_check_payloads.clone(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Process Agent Configuration ===\n");
    println!("Host: {}", info.hostname);
    println!(
        "Real-time checks: {}",
        if info.real_time { "enabled" } else { "disabled" }
    );

    println!("\nQueues:");
    for queue in &info.queues {
        println!(
            "  - {}: max_items={} max_bytes={}",
            queue.name, queue.max_items, queue.max_bytes
        );
    }

    println!("\nChecks ({}):", info.checks.len());
    for check in &info.checks {
        match check.real_time_name {
            Some(ref rt) => println!(
                "  - {} every {}s -> {} (real-time: {})",
                check.name, check.interval_secs, check.queue, rt
            ),
            None => println!(
                "  - {} every {}s -> {}",
                check.name, check.interval_secs, check.queue
            ),
        }
    }

    println!("\nForwarder: {}", info.forwarder.kind);
    let mut params: Vec<_> = info.forwarder.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("  {}: {}", key, value);
    }

    if !info.drop_check_payloads.is_empty() {
        println!("\nDropped payloads: {:?}", info.drop_check_payloads);
    }
    println!();
}
