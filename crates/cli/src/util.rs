//! Shared utilities for CLI commands

use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use fy_store::CheckpointStore;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Store root used when neither `--root` nor `storage.root` is set,
/// relative to the home directory
pub const DEFAULT_ROOT: &str = ".claude-code/forks";

/// Resolve the store root: `--root` flag, then config, then the default
pub fn resolve_root(flag: Option<&Path>, config: &SystemConfig) -> Result<PathBuf> {
    if let Some(root) = flag {
        return Ok(root.to_path_buf());
    }
    if let Some(root) = &config.storage.root {
        return expand_home(root);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DEFAULT_ROOT))
}

/// Open the checkpoint store with options from config
pub fn open_store(flag: Option<&Path>, config: &SystemConfig) -> Result<CheckpointStore> {
    let root = resolve_root(flag, config)?;
    let store = CheckpointStore::open(&root)
        .with_context(|| format!("Failed to open fork store at {}", root.display()))?;
    Ok(store.with_options(config.store_options()))
}

/// Expand a leading `~/` against the home directory
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().context("Could not determine home directory")?;
            Ok(home.join(rest))
        }
        None if path == "~" => dirs::home_dir().context("Could not determine home directory"),
        None => Ok(PathBuf::from(path)),
    }
}

/// Print a value as pretty JSON (2-space indentation) on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Parse a command-line argument that must be a JSON object
pub fn parse_object(arg: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(arg).context("Updates must be valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("Updates must be a JSON object, got: {}", other),
    }
}
