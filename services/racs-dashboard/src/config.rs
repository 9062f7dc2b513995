//! Configuration types for the dashboard client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Where the RACS backend lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on a single HTTP request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Timer intervals for the polling views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub log_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub project_interval_ms: u64,
}

impl PollingConfig {
    pub fn log_interval(&self) -> Duration {
        Duration::from_millis(self.log_interval_ms)
    }

    pub fn project_interval(&self) -> Duration {
        Duration::from_millis(self.project_interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            log_interval_ms: default_interval_ms(),
            project_interval_ms: default_interval_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    if config.polling.log_interval_ms == 0 || config.polling.project_interval_ms == 0 {
        return Err(crate::DashboardError::Config(
            "polling intervals must be greater than zero".to_string(),
        ));
    }
    if config.server.request_timeout_ms == 0 {
        return Err(crate::DashboardError::Config(
            "request timeout must be greater than zero".to_string(),
        ));
    }
    Ok(config)
}
