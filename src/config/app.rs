//! Application configuration structures.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::netscaler::TargetConfig;

use super::validation::{ConfigError, expand_env_vars, validate_metrics_path};

// =============================================================================
// Constants
// =============================================================================

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9280;

/// Default scrape endpoint.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9280).
    pub port: u16,

    /// Scrape endpoint path (default: "/metrics").
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

// =============================================================================
// NetScaler Configuration
// =============================================================================

/// Appliances to scrape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetscalerConfig {
    /// Statically configured targets.
    #[serde(default)]
    pub static_targets: Vec<TargetConfig>,
}

impl NetscalerConfig {
    /// Substitute `${VAR}` / `${VAR:-default}` in host and credentials.
    pub fn expand_env_vars(&mut self) {
        for target in &mut self.static_targets {
            target.host = expand_env_vars(&target.host);
            target.username = expand_env_vars(&target.username);
            target.password = expand_env_vars(&target.password);
        }
    }

    /// Validate every target and reject duplicate hosts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_hosts = HashSet::new();

        for target in &self.static_targets {
            if target.host.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "target host cannot be empty".to_string(),
                ));
            }
            if !seen_hosts.insert(&target.host) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate target host: '{}'",
                    target.host
                )));
            }
            if target.username.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "target '{}': username cannot be empty",
                    target.host
                )));
            }
            if target.timeout.is_zero() {
                return Err(ConfigError::ValidationError(format!(
                    "target '{}': timeout must be positive",
                    target.host
                )));
            }

            let url = url::Url::parse(&target.base_url()).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "target '{}': invalid URL '{}': {}",
                    target.host,
                    target.base_url(),
                    e
                ))
            })?;
            if url.path() != "/" || url.query().is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "target '{}': host must not contain a path or query",
                    target.host
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Targets to scrape.
    #[serde(default)]
    pub netscaler: NetscalerConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse, expand environment variables and validate a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.netscaler.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        // Validate metrics path
        validate_metrics_path(&self.server.metrics_path)?;

        self.netscaler.validate()
    }
}
