//! # Application Configuration
//!
//! Optional TOML file read at startup. Every key may be omitted:
//!
//! ```toml
//! max_iterations = 100
//! include_annotations = true
//! log_format = "text"   # or "json"
//! pretty = true
//! ```
//!
//! Command-line flags override file values; `IHGRAPH_LOG_FORMAT` overrides
//! `log_format`.

use ihgraph_core::IHGraphError;
use ihgraph_core::primitives::DEFAULT_MAX_ITERATIONS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ihgraph.toml";

/// Maximum accepted size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse the value of `IHGRAPH_LOG_FORMAT`; anything but `json` is text.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Bound on induction folds.
    pub max_iterations: usize,
    /// Whether exported JSON carries annotations.
    pub include_annotations: bool,
    pub log_format: LogFormat,
    /// Pretty-print exported JSON.
    pub pretty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            include_annotations: true,
            log_format: LogFormat::Text,
            pretty: true,
        }
    }
}

impl AppConfig {
    /// Load `path`, or `ihgraph.toml` from the working directory when it
    /// exists, or fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, IHGraphError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read and parse one configuration file.
    pub fn from_file(path: &Path) -> Result<Self, IHGraphError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            IHGraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(IHGraphError::SerializationError(format!(
                "Config size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            IHGraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self, IHGraphError> {
        toml::from_str(text)
            .map_err(|e| IHGraphError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Log format after applying the environment override.
    #[must_use]
    pub fn effective_log_format(&self, env_value: Option<&str>) -> LogFormat {
        env_value.map_or(self.log_format, LogFormat::from_env_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core_constants() {
        let config = AppConfig::default();
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(config.include_annotations);
        assert!(config.pretty);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml("max_iterations = 7\nlog_format = \"json\"\n")
            .expect("parse");
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.include_annotations);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = AppConfig::from_toml("max_iteration = 7\n");
        assert!(matches!(result, Err(IHGraphError::SerializationError(_))));
    }

    #[test]
    fn environment_overrides_log_format() {
        let config = AppConfig::default();
        assert_eq!(config.effective_log_format(None), LogFormat::Text);
        assert_eq!(config.effective_log_format(Some("JSON")), LogFormat::Json);
        assert_eq!(config.effective_log_format(Some("pretty")), LogFormat::Text);
    }
}
