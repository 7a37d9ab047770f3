//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce the `AgentConfig` driving the collector
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("agent.toml")).unwrap();
//! println!("Host: {}", config.hostname);
//! ```

mod parser;
mod validator;

pub use contracts::AgentConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<AgentConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AgentConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize AgentConfig to TOML string
    pub fn to_toml(config: &AgentConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AgentConfig to JSON string
    pub fn to_json(config: &AgentConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AgentConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const AGENT_TOML: &str = r#"
hostname = "web-1"
queue_size = 128
drop_check_payloads = ["process_discovery"]

[check_intervals]
connections = 15

[orchestrator]
collection_enabled = true
cluster_id = "c-42"

[forwarder]
kind = "log"
params = { domains = "a.example,b.example", active_clients = "1" }

[[checks]]
name = "process"
messages = 2

[[checks]]
name = "connections"

[[checks]]
name = "process_discovery"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(AGENT_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.hostname, "web-1");
        assert_eq!(config.queue_size, 128);
        assert_eq!(config.checks.len(), 3);
        assert_eq!(config.check_interval("connections"), Duration::from_secs(15));
        assert_eq!(config.check_interval("process"), Duration::from_secs(10));
        assert_eq!(config.orchestrator.cluster_id.as_deref(), Some("c-42"));
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(AGENT_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(again.hostname, config.hostname);
        assert_eq!(again.checks.len(), config.checks.len());
        assert_eq!(again.forwarder.params, config.forwarder.params);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(AGENT_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(again.drop_check_payloads, vec!["process_discovery"]);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(AGENT_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.hostname, "web-1");
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[checks]]
name = "process"

[[checks]]
name = "process"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}
