//! # Process Agent CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 采集器编排与生命周期管理
//! - 优雅关闭处理

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_collector, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = process_agent_cli::pipeline::AGENT_VERSION,
        "Process agent starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_collector(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging only; the metrics exporter is installed by `run`
fn init_logging(cli: &Cli) -> Result<()> {
    let (default_log_level, force_level) = if cli.quiet {
        ("warn", true)
    } else {
        let level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        (level, false)
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        force_level,
    })
}
