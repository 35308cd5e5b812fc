//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.sigroute/config.toml`
//! 2. Local config: `.sigroute/config.toml` (in the working directory)
//!    or an explicit file passed with `--config`
//! 3. CLI overrides
//!
//! Later sources override earlier ones. A field in a later file only wins
//! when it differs from the built-in default, so partial files compose.

use crate::error::ConfigError;
use crate::{
    ConfigOverrides, LoggingConfig, PartitionSettings, SearchSettings, SolverConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".sigroute";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".sigroute";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.sigroute`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<SolverConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.sigroute`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path under `root`.
    pub fn local_config_path(&self, root: &Path) -> PathBuf {
        root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a working directory with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates.
    pub fn load(
        &mut self,
        root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SolverConfig, ConfigError> {
        let local = self.load_local(root)?;
        self.finish(local, overrides)
    }

    /// Load configuration using an explicit file in place of the local one.
    ///
    /// Unlike the local file, an explicit file must exist.
    pub fn load_with_file(
        &mut self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SolverConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        debug!("Loading config from {:?}", path);
        let explicit = load_config_file(path)?;
        self.finish(Some(explicit), overrides)
    }

    fn finish(
        &mut self,
        local: Option<SolverConfig>,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SolverConfig, ConfigError> {
        let mut config = SolverConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = local {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<SolverConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration under `root`.
    pub fn load_local(&self, root: &Path) -> Result<Option<SolverConfig>, ConfigError> {
        let local_path = self.local_config_path(root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the global config file.
    pub fn save_global(&self, config: &SolverConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        save_config_file(&global_dir.join(CONFIG_FILE_NAME), config)
    }

    /// Save configuration to the local config file under `root`.
    pub fn save_local(&self, root: &Path, config: &SolverConfig) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(root), config)
    }

    /// Initialize the global configuration directory.
    ///
    /// Creates `~/.sigroute/config.toml` with default configuration. An
    /// existing file is left untouched.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };
        init_dir(global_dir)
    }

    /// Initialize local configuration under `root`.
    ///
    /// Creates `.sigroute/config.toml` with default configuration.
    pub fn init_local(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        init_dir(&root.join(LOCAL_CONFIG_DIR))
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn init_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        save_config_file(&config_path, &SolverConfig::default())?;
    }

    Ok(config_path)
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<SolverConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &SolverConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = config.to_toml()?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Merge two configurations, with `overlay` taking precedence.
fn merge_configs(base: SolverConfig, overlay: SolverConfig) -> SolverConfig {
    SolverConfig {
        search: merge_search(base.search, overlay.search),
        partition: merge_partition(base.partition, overlay.partition),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

/// Pick `overlay` when it was set away from `default`, otherwise keep `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: &T) -> T {
    if overlay != *default {
        overlay
    } else {
        base
    }
}

fn merge_search(base: SearchSettings, overlay: SearchSettings) -> SearchSettings {
    let d = SearchSettings::default();
    SearchSettings {
        time_limit_ms: pick(base.time_limit_ms, overlay.time_limit_ms, &d.time_limit_ms),
        play_reserve_ms: pick(
            base.play_reserve_ms,
            overlay.play_reserve_ms,
            &d.play_reserve_ms,
        ),
        sample_size: pick(base.sample_size, overlay.sample_size, &d.sample_size),
        augment_batch: pick(base.augment_batch, overlay.augment_batch, &d.augment_batch),
        eval_window: pick(base.eval_window, overlay.eval_window, &d.eval_window),
        workers: pick(base.workers, overlay.workers, &d.workers),
        seed: pick(base.seed, overlay.seed, &d.seed),
    }
}

fn merge_partition(base: PartitionSettings, overlay: PartitionSettings) -> PartitionSettings {
    let d = PartitionSettings::default();
    PartitionSettings {
        shuffle_cover: pick(base.shuffle_cover, overlay.shuffle_cover, &d.shuffle_cover),
        chunk_overlap: pick(base.chunk_overlap, overlay.chunk_overlap, &d.chunk_overlap),
        tie_order_hops: pick(
            base.tie_order_hops,
            overlay.tie_order_hops,
            &d.tie_order_hops,
        ),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let d = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, &d.level),
        format: pick(base.format, overlay.format, &d.format),
    }
}
