//! CLI configuration, read from `<config dir>/feedr/feedr.toml` unless a
//! path is given explicitly.

use feedr_core::{FeedrError, FeedrResult};
use feedr_io::ConvertOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeedrConfig {
    #[serde(default)]
    pub convert: ConvertOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FeedrConfig {
    /// Configured level, or INFO when it does not parse.
    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("feedr").join("feedr.toml"))
}

fn read_config(path: &Path) -> FeedrResult<FeedrConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| FeedrError::Config(format!("reading '{}': {}", path.display(), e)))?;
    toml::from_str(&contents)
        .map_err(|e| FeedrError::Config(format!("parsing '{}': {}", path.display(), e)))
}

/// Load the configuration. An explicit path must exist; the default
/// location is optional.
pub fn load_config(explicit: Option<&Path>) -> FeedrResult<FeedrConfig> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => read_config(&path),
        _ => Ok(FeedrConfig::default()),
    }
}
