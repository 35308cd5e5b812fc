//! sigroute Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.sigroute/config.toml`
//! - Local config: `.sigroute/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

/// Root configuration for the solver.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SolverConfig {
    /// Search loop settings
    pub search: SearchSettings,

    /// Partition construction settings
    pub partition: PartitionSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Search loop settings.
///
/// # Example TOML
///
/// ```toml
/// [search]
/// time_limit_ms = 2800
/// workers = 4
/// seed = 42
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchSettings {
    /// Total wall-clock budget in milliseconds
    pub time_limit_ms: u64,

    /// Part of the budget kept for the final play-through
    pub play_reserve_ms: u64,

    /// Hops sampled per augmentation
    pub sample_size: usize,

    /// Augmentations applied to a candidate per round
    pub augment_batch: usize,

    /// Leading targets evaluated per candidate (0 = all)
    pub eval_window: usize,

    /// Candidates explored in parallel per round
    pub workers: usize,

    /// Run seed
    pub seed: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            time_limit_ms: 1900,
            play_reserve_ms: 150,
            sample_size: 24,
            augment_batch: 4,
            eval_window: 0,
            workers: 1,
            seed: 0x5EED,
        }
    }
}

/// Partition construction settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartitionSettings {
    /// Cover uncovered nodes in random order instead of ascending id
    pub shuffle_cover: bool,

    /// Nodes shared by consecutive chunks of a split path
    pub chunk_overlap: usize,

    /// Tie consecutive targets of the visitation order before covering
    pub tie_order_hops: bool,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            shuffle_cover: true,
            chunk_overlap: 1,
            tie_order_hops: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid_value(
                "logging.format",
                format!("unknown format '{}', expected text or json", other),
            )),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override total time budget
    pub time_limit_ms: Option<u64>,

    /// Override run seed
    pub seed: Option<u64>,

    /// Override parallel workers
    pub workers: Option<usize>,

    /// Override log level
    pub log_level: Option<String>,

    /// Override log format
    pub log_format: Option<LogFormat>,
}

impl SolverConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(limit) = overrides.time_limit_ms {
            self.search.time_limit_ms = limit;
        }

        if let Some(seed) = overrides.seed {
            self.search.seed = seed;
        }

        if let Some(workers) = overrides.workers {
            self.search.workers = workers;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }

        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.sample_size == 0 {
            return Err(ConfigError::invalid_value(
                "search.sample_size",
                "must be at least 1",
            ));
        }
        if self.search.workers == 0 {
            return Err(ConfigError::invalid_value(
                "search.workers",
                "must be at least 1",
            ));
        }
        if self.search.play_reserve_ms >= self.search.time_limit_ms {
            return Err(ConfigError::invalid_value(
                "search.play_reserve_ms",
                format!(
                    "{} must be smaller than search.time_limit_ms ({})",
                    self.search.play_reserve_ms, self.search.time_limit_ms
                ),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level '{}'", self.logging.level),
            ));
        }
        Ok(())
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.search.time_limit_ms, 1900);
        assert_eq!(config.search.play_reserve_ms, 150);
        assert_eq!(config.search.sample_size, 24);
        assert_eq!(config.search.workers, 1);
        assert_eq!(config.search.seed, 0x5EED);
        assert!(config.partition.shuffle_cover);
        assert_eq!(config.partition.chunk_overlap, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: SolverConfig = toml::from_str(
            r#"
            [search]
            workers = 8

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.search.workers, 8);
        assert_eq!(config.search.time_limit_ms, 1900);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.partition, PartitionSettings::default());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = SolverConfig::default();
        config.apply_overrides(&ConfigOverrides {
            time_limit_ms: Some(500),
            seed: Some(9),
            log_level: Some("debug".to_string()),
            ..Default::default()
        });

        assert_eq!(config.search.time_limit_ms, 500);
        assert_eq!(config.search.seed, 9);
        assert_eq!(config.search.workers, 1);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SolverConfig::default();
        config.search.sample_size = 0;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::default();
        config.search.workers = 0;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::default();
        config.search.play_reserve_ms = config.search.time_limit_ms;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("play_reserve_ms"));

        let mut config = SolverConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_render_round_trip() {
        let config = SolverConfig::default();
        let toml_text = config.to_toml().unwrap();
        let parsed: SolverConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(parsed, config);
        assert!(config.to_json().unwrap().contains("\"time_limit_ms\": 1900"));
    }
}
