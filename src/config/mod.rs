//! Configuration module for the exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (bind address, port, metrics path)
//! - NetScaler targets (host, scheme, credentials, timeout)

mod app;
mod validation;

pub use app::{AppConfig, NetscalerConfig, ServerConfig};
pub use validation::{ConfigError, expand_env_vars, validate_metrics_path};

// Re-export constants
pub use app::{DEFAULT_METRICS_PATH, DEFAULT_PORT};
