//! Configuration validation utilities.

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

/// Paths served by the router besides the scrape endpoint.
pub const RESERVED_PATHS: &[&str] = &["/", "/healthz", "/api/describe"];

/// Check that `path` can be mounted as a static scrape route.
///
/// Route captures (`{name}`, `*rest`, `:name`) are rejected, as is any
/// path shadowing a built-in route.
pub fn validate_metrics_path(path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') || path.contains(char::is_whitespace) {
        return Err(ConfigError::ValidationError(format!(
            "invalid metrics path: '{}'",
            path
        )));
    }
    if path.contains(['{', '}', '*']) || path.split('/').any(|seg| seg.starts_with(':')) {
        return Err(ConfigError::ValidationError(format!(
            "metrics path '{}' must not contain route captures",
            path
        )));
    }
    if RESERVED_PATHS.contains(&path) {
        return Err(ConfigError::ValidationError(format!(
            "metrics path '{}' collides with a built-in route",
            path
        )));
    }
    Ok(())
}
