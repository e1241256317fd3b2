//! CLI command execution helpers with automatic timing
//!
//! This module provides a wrapper around the `fy` CLI binary that
//! automatically measures execution time and provides convenient
//! assertion methods.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct FyCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    root: Option<PathBuf>,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl FyCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_fy")),
            working_dir: working_dir.as_ref().to_path_buf(),
            root: None,
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    /// Pass `--root <dir>` ahead of the subcommand
    pub fn root(&mut self, root: impl Into<PathBuf>) -> &mut Self {
        self.root = Some(root.into());
        self
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let mut command = Command::new(&self.binary_path);
        if let Some(root) = &self.root {
            command.arg("--root").arg(root);
        }
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env_remove("FY_CONFIG")
            .envs(&self.env);

        let output = command.output().context("Failed to execute command")?;
        let elapsed = start.elapsed();

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: elapsed,
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.stdout)
            .with_context(|| format!("stdout is not JSON:\n{}", self.stdout))
    }

    /// Parse the first generated fork ID (12 lowercase hex chars) from output
    pub fn parse_fork_id(&self) -> Option<String> {
        self.stdout.lines().find_map(extract_fork_id)
    }
}

/// Extract a generated fork ID from a line of text
pub fn extract_fork_id(line: &str) -> Option<String> {
    line.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|word| {
            word.len() == 12 && word.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
        })
        .map(str::to_string)
}

/// Macro for convenient command construction against a [`TestStore`](super::TestStore)
///
/// Usage:
/// ```ignore
/// fy!(store, "create", "abc").assert_success()?;
/// fy!(store, "export", "abc", out.to_str().unwrap()).assert_success()?;
/// ```
#[macro_export]
macro_rules! fy {
    ($store:expr, $($arg:expr),*) => {{
        let mut cmd = $store.command();
        cmd.args(&[$($arg),*]);
        cmd
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fork_id_extraction() {
        let line = "✓ Imported checkpoint as fork: 3fa9c01b7e2d";
        assert_eq!(extract_fork_id(line), Some("3fa9c01b7e2d".to_string()));
    }

    #[test]
    fn test_fork_id_extraction_skips_other_words() {
        assert_eq!(extract_fork_id("Deleted fork: my-feature"), None);
        assert_eq!(extract_fork_id("ABCDEF123456"), None);
        assert_eq!(extract_fork_id("3fa9c01b7e2d00"), None);

        let result = CommandResult {
            stdout: "header\nid 0123456789ab\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::from_millis(10),
        };
        assert_eq!(result.parse_fork_id(), Some("0123456789ab".to_string()));
    }
}
