//! On-disk layout and crash-safe writes for the fork store

use anyhow::{Context, Result};
use std::fs::DirEntry;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Checkpoint body file name inside a fork directory
pub const CHECKPOINT_FILE: &str = "checkpoint.json";
/// Fork metadata file name inside a fork directory
pub const METADATA_FILE: &str = "metadata.json";
/// Directory (under the root) holding per-fork lock files
pub const LOCKS_DIR: &str = ".locks";

/// Directory structure of a fork store
///
/// ```text
/// <root>/
///   .locks/
///     <fork_id>.lock
///   <fork_id>/
///     checkpoint.json
///     metadata.json
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Open a layout rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store root: {}", root.display()))?;
        Ok(Self { root })
    }

    /// Store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fork_dir(&self, fork_id: &str) -> PathBuf {
        self.root.join(fork_id)
    }

    pub fn checkpoint_path(&self, fork_id: &str) -> PathBuf {
        self.fork_dir(fork_id).join(CHECKPOINT_FILE)
    }

    pub fn metadata_path(&self, fork_id: &str) -> PathBuf {
        self.fork_dir(fork_id).join(METADATA_FILE)
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.root.join(LOCKS_DIR)
    }

    pub fn lock_path(&self, fork_id: &str) -> PathBuf {
        self.locks_dir().join(format!("{}.lock", fork_id))
    }

    /// Names of every fork location under the root
    ///
    /// Dot-directories, plain files and non-UTF-8 names are skipped, as are
    /// entries that cannot be read (with a warning). The order is whatever
    /// the filesystem enumerates.
    pub fn fork_dirs(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read store root: {}", self.root.display()))?;

        Ok(entries.filter_map(fork_dir_name).collect())
    }
}

fn fork_dir_name(entry: std::io::Result<DirEntry>) -> Option<String> {
    let entry = match entry {
        Ok(entry) => entry,
        Err(error) => {
            tracing::warn!(%error, "skipping unreadable store entry");
            return None;
        }
    };

    match entry.file_type() {
        Ok(file_type) if file_type.is_dir() => {}
        Ok(_) => return None,
        Err(error) => {
            tracing::warn!(path = %entry.path().display(), %error, "skipping unreadable store entry");
            return None;
        }
    }

    entry
        .file_name()
        .to_str()
        .filter(|name| !name.starts_with('.'))
        .map(str::to_string)
}

/// A fork id that cannot name a single directory under the store root
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fork id {id:?}: {reason}")]
pub struct InvalidForkId {
    pub id: String,
    pub reason: &'static str,
}

/// Check that `fork_id` is usable as a fork directory name
///
/// - Rejects empty ids
/// - Rejects path separators and NUL
/// - Rejects leading `.` (covers `.`/`..`; dot-names are reserved for store internals)
pub fn validate_fork_id(fork_id: &str) -> std::result::Result<(), InvalidForkId> {
    let reason = if fork_id.is_empty() {
        "empty"
    } else if fork_id.starts_with('.') {
        "must not start with '.'"
    } else if fork_id.contains(['/', '\\']) {
        "must not contain path separators"
    } else if fork_id.contains('\0') {
        "must not contain NUL"
    } else {
        return Ok(());
    };

    Err(InvalidForkId {
        id: fork_id.to_string(),
        reason,
    })
}

/// Atomic write helper
///
/// Writes data to a temporary file next to `target`, fsyncs it, then renames
/// it over the target. Readers see either the old or the new content.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    StagedWrite::stage(target, data)?.commit()
}

/// A fully written, fsynced temporary file waiting to be renamed into place
///
/// Dropping it without [`commit`](StagedWrite::commit) removes the temp file
/// and leaves the target untouched.
pub struct StagedWrite {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    /// Write `data` to a temp file in the target's directory
    pub fn stage(target: &Path, data: &[u8]) -> Result<Self> {
        let dir = parent_dir(target);
        let mut file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

        file.write_all(data)
            .with_context(|| format!("Failed to write temp file for {}", target.display()))?;
        file.as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync temp file for {}", target.display()))?;

        Ok(Self {
            file,
            target: target.to_path_buf(),
        })
    }

    /// Final destination of this write
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temp file over the target
    pub fn commit(self) -> Result<()> {
        let Self { file, target } = self;
        file.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", target.display()))?;

        sync_dir(parent_dir(&target));
        tracing::debug!(path = %target.display(), "committed write");
        Ok(())
    }
}

/// Directory containing `path` (`.` for bare file names)
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Best-effort fsync of a directory so a rename survives a crash
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    let result = std::fs::File::open(dir).and_then(|d| d.sync_all());
    if let Err(e) = result {
        tracing::debug!(dir = %dir.display(), error = %e, "directory sync skipped");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
