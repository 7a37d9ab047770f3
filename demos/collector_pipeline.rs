//! Collector Pipeline Example
//!
//! Loads an agent configuration (or builds a small one), runs the full
//! `Collector` for a few seconds and prints the run statistics.
//!
//! Run with: cargo run -p collector_demos --bin collector_pipeline [config.toml]

use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{AgentConfig, CheckSpec, ForwarderConfig};
use process_agent_cli::Collector;

const RUN_FOR: Duration = Duration::from_secs(12);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Collector Pipeline Demo");

    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading agent config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_demo_config()
    };

    let checks = checks::build_checks(&config.checks);
    let forwarder_config = config.forwarder.clone();
    let collector = Collector::new(config, checks, |queue| {
        dispatcher::create_forwarder(queue, &forwarder_config)
    })?;

    let stats = collector.run(tokio::time::sleep(RUN_FOR)).await?;
    stats.print_summary();

    Ok(())
}

/// Process, connections and pod checks; the log forwarder reports one client
fn create_demo_config() -> AgentConfig {
    let mut config = AgentConfig {
        hostname: "demo-host".to_string(),
        checks: vec![
            CheckSpec::named("process"),
            CheckSpec::named("connections"),
            CheckSpec::named("pod"),
        ],
        forwarder: ForwarderConfig {
            params: [
                ("active_clients".to_string(), "1".to_string()),
                ("interval".to_string(), "1".to_string()),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        },
        ..Default::default()
    };
    config.check_intervals.insert("connections".to_string(), 5);
    config.orchestrator.collection_enabled = true;
    config
}
