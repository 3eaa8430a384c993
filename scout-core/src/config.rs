//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/scout/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/scout/` (~/.config/scout/)
//! - State/Logs: `$XDG_STATE_HOME/scout/` (~/.local/state/scout/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Research agent configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Research agent endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// Agent URL; new conversations POST here, follow-ups PUT to `<endpoint>/<run id>`
    pub endpoint: Option<String>,

    /// Bearer token sent with every request (optional)
    pub api_key: Option<String>,

    /// Response header carrying the run identifier
    #[serde(default = "default_run_id_header")]
    pub run_id_header: String,

    /// Client-side deadline for a whole search, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            run_id_header: default_run_id_header(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_run_id_header() -> String {
    "X-Toolhouse-Run-ID".to_string()
}

fn default_timeout() -> u64 {
    600
}

fn default_connect_timeout() -> u64 {
    30
}

impl AgentConfig {
    /// Check if an endpoint is configured
    pub fn is_ready(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("agent.endpoint is required".to_string()))?;

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::Config(format!(
                "agent.endpoint must be an http(s) URL, got {endpoint:?}"
            )));
        }
        if self.run_id_header.trim().is_empty() {
            return Err(Error::Config(
                "agent.run_id_header must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "agent.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Deadline applied to a whole search
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/scout/config.toml` (~/.config/scout/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("scout").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/scout/` (~/.local/state/scout/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("scout")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.agent.endpoint.is_none());
        assert_eq!(config.agent.run_id_header, "X-Toolhouse-Run-ID");
        assert_eq!(config.agent.timeout_secs, 600);
        assert_eq!(config.logging.level, "info");
        assert!(!config.agent.is_ready());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[agent]
endpoint = "https://agents.example.com/research"
timeout_secs = 120

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.agent.endpoint.as_deref(),
            Some("https://agents.example.com/research")
        );
        assert_eq!(config.agent.deadline(), Duration::from_secs(120));
        assert_eq!(config.agent.connect_timeout_secs, 30);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_agent_config_validation() {
        let config = AgentConfig::default();
        assert!(config.validate().is_err());

        let config = AgentConfig {
            endpoint: Some("agents.example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            endpoint: Some("https://agents.example.com".to_string()),
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            endpoint: Some("https://agents.example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_ready());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nendpoint = \"http://localhost:9000\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.agent.endpoint.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nendpoint = 3").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
