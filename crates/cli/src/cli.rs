//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Process Agent - periodic process/container collection with real-time feedback
#[derive(Parser, Debug)]
#[command(
    name = "process-agent",
    author,
    version,
    about = "Process collection agent",
    long_about = "Runs the configured checks on their intervals, buffers results in bounded \n\
                  delivery queues and forwards them to the backend. Backend status \n\
                  responses switch real-time collection on and off."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PROCESS_AGENT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PROCESS_AGENT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the collector
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display queues, checks and intervals
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "process-agent.toml",
        env = "PROCESS_AGENT_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the hostname reported in payload headers
    #[arg(long, env = "PROCESS_AGENT_HOSTNAME")]
    pub hostname: Option<String>,

    /// Stop after this many seconds (0 = run until signalled)
    #[arg(long, default_value = "0", env = "PROCESS_AGENT_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without starting the collector
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled, unset = use configuration)
    #[arg(long, env = "PROCESS_AGENT_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "process-agent.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "process-agent.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
