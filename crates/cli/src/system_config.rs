//! System-wide configuration for the `fy` binary
//!
//! Read from `$FY_CONFIG` when set, otherwise
//! `<config_dir>/fork-yeah/config.toml`. A missing file means defaults.

use anyhow::{Context, Result};
use fy_store::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "FY_CONFIG";

/// Accepted values for `log.level`
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub storage: StorageConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Fork store root; `~/` is expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub refresh_metadata_on_update: bool,
    pub index_on_import: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl SystemConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            anyhow::bail!(
                "log.level must be one of {} (got '{}')",
                LOG_LEVELS.join(", "),
                self.log.level
            );
        }
        if matches!(self.storage.root.as_deref(), Some(root) if root.trim().is_empty()) {
            anyhow::bail!("storage.root must not be empty");
        }
        Ok(())
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            refresh_metadata_on_update: self.store.refresh_metadata_on_update,
            index_on_import: self.store.index_on_import,
        }
    }
}

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("fork-yeah").join("config.toml"))
}

/// Load the system config (defaults if the file does not exist)
pub fn load() -> Result<SystemConfig> {
    match config_file_path() {
        Some(path) => load_from(&path),
        None => Ok(SystemConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

/// Save the system config, creating parent directories as needed
pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(&path, config)
}

pub fn save_to(path: &Path, config: &SystemConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fy_core::atomic_write(path, contents.as_bytes())
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Write the example config if no config file exists yet
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        fy_core::atomic_write(&path, example_config().as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    }
    Ok(path)
}

/// Documented example config with every default spelled out
pub fn example_config() -> String {
    r#"# fork-yeah configuration

[storage]
# Where fork directories live (default: ~/.claude-code/forks)
# root = "~/.claude-code/forks"

[store]
# Rewrite fork metadata (last_modified, parent_id) after every update
refresh_metadata_on_update = false
# Write fork metadata for imported checkpoints so they show up in list/tree
index_on_import = false

[log]
# error | warn | info | debug | trace
level = "warn"
"#
    .to_string()
}
