//! Pipeline configuration.
//!
//! Process-wide knobs (worker count, file check interval, log verbosity)
//! read from a JSON file. Per-source settings live in [`crate::settings`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOADER_WORKERS, FILE_CHECK_INTERVAL_SECS};
use crate::error::ConfigError;

/// Log level setting for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings (failed decodes)
    Warn,
    /// Also show worker start/stop
    #[default]
    Info,
    /// Also show every load, publish and promotion
    Debug,
    /// Also show per-frame animation detail
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Process-wide pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Number of background decode workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds between modification-time checks of a showing source
    #[serde(default = "default_check_interval")]
    pub file_check_interval_secs: f32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_workers() -> usize {
    DEFAULT_LOADER_WORKERS
}

fn default_check_interval() -> f32 {
    FILE_CHECK_INTERVAL_SECS
}

impl PipelineConfig {
    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    ///
    /// A worker count of zero is raised to one.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }

        config.workers = config.workers.max(1);
        Ok(config)
    }

    /// Read configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            workers: DEFAULT_LOADER_WORKERS,
            file_check_interval_secs: FILE_CHECK_INTERVAL_SECS,
            log_level: LogLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config =
            PipelineConfig::from_json(r#"{ "workers": 4, "log_level": "trace" }"#).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.file_check_interval_secs, FILE_CHECK_INTERVAL_SECS);
    }

    #[test]
    fn test_zero_workers_raised() {
        let config = PipelineConfig::from_json(r#"{ "workers": 0 }"#).unwrap();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = PipelineConfig::from_json(r#"{ "version": 99 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedVersion {
                found: 99,
                supported: CONFIG_VERSION
            }
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_json_output_is_readable_back() {
        let config = PipelineConfig {
            workers: 3,
            log_level: LogLevel::Debug,
            ..PipelineConfig::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"debug\""));
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }
}
