//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::AgentConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    hostname: String,
    check_count: usize,
    forwarder: String,
    real_time: bool,
    dropped_checks: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    hostname: config.hostname.clone(),
                    check_count: config.checks.len(),
                    forwarder: format!("{:?}", config.forwarder.kind),
                    real_time: config.run_real_time(),
                    dropped_checks: config.drop_check_payloads.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AgentConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let enabled = |name: &str| config.checks.iter().any(|c| c.name == name);

    if config.checks.is_empty() {
        warnings.push("No checks configured - the collector will only run telemetry".to_string());
    }

    for name in &config.drop_check_payloads {
        if enabled(name) {
            warnings.push(format!("Payloads of check '{}' are dropped", name));
        }
    }

    for name in config.check_intervals.keys() {
        if !enabled(name) {
            warnings.push(format!("Interval configured for disabled check '{}'", name));
        }
    }

    if !config.run_real_time() && config.checks.iter().any(|c| c.name.starts_with("rt")) {
        warnings.push(
            "Real-time checks are configured but disable_realtime_checks is set".to_string(),
        );
    }

    if config.orchestrator.manifest_collection_enabled && !config.orchestrator.collection_enabled {
        warnings.push(
            "orchestrator.manifest_collection_enabled has no effect without collection_enabled"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Host: {}", summary.hostname);
            println!("  Checks: {}", summary.check_count);
            println!("  Forwarder: {}", summary.forwarder);
            println!("  Real-time: {}", summary.real_time);
            println!("  Dropped checks: {}", summary.dropped_checks);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CheckSpec;

    #[test]
    fn test_warnings() {
        let mut config = AgentConfig::default();
        config.checks = vec![CheckSpec::named("process"), CheckSpec::named("rtprocess")];
        config.drop_check_payloads = vec!["process".into(), "pod".into()];
        config.check_intervals.insert("connections".into(), 5);
        config.disable_realtime_checks = true;

        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("'process'"));
        assert!(warnings[1].contains("'connections'"));
        assert!(warnings[2].contains("disable_realtime_checks"));
    }

    #[test]
    fn test_no_checks_warns() {
        let warnings = collect_warnings(&AgentConfig::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "/nonexistent/process-agent.toml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
