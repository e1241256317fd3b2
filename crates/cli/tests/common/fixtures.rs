//! Throwaway fork stores for integration tests

use super::cli::FyCommand;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temp directory holding a fork store root and a private config file
///
/// Commands built from it never see the user's real config or store.
pub struct TestStore {
    temp: TempDir,
}

impl TestStore {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create temp dir")?;
        Ok(Self { temp })
    }

    /// Scratch directory (working directory of every command)
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("forks")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    /// Command with `--root` pointing at this store
    pub fn command(&self) -> FyCommand {
        let mut cmd = self.command_without_root();
        cmd.root(self.root());
        cmd
    }

    /// Command that resolves its root from config
    pub fn command_without_root(&self) -> FyCommand {
        let mut cmd = FyCommand::new(self.path());
        cmd.env("FY_CONFIG", &self.config_path().to_string_lossy());
        cmd
    }

    /// Write the private config file
    pub fn write_config(&self, contents: &str) -> Result<()> {
        std::fs::write(self.config_path(), contents).context("Failed to write config")
    }

    /// Read a fork's checkpoint straight from disk
    pub fn read_checkpoint(&self, fork_id: &str) -> Result<Value> {
        let path = self.root().join(fork_id).join("checkpoint.json");
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).context("checkpoint.json is not JSON")
    }
}
