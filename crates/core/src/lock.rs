//! Per-fork advisory locks
//!
//! Writers take an exclusive `flock` on `<root>/.locks/<fork_id>.lock` for the
//! duration of a read-merge-write sequence. Lock files live outside the fork
//! directories so that locking a fork never creates its storage location.
//!
//! Lock files outlive their forks: deleting a fork leaves `<fork_id>.lock`
//! behind, so `.locks/` grows with every id ever written. [`prune_locks`]
//! removes the files of forks that no longer exist. A file is only unlinked
//! while its lock is held, and a holder re-checks after locking that it still
//! owns the file at the lock path, retrying on a fresh file if not.

use crate::store::{validate_fork_id, Layout};
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive lock on one fork, released on drop
pub struct ForkLock {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

impl ForkLock {
    /// Acquire the lock, blocking until any other holder releases it
    pub fn acquire(layout: &Layout, fork_id: &str) -> Result<Self> {
        loop {
            let (path, file) = open_lock_file(layout, fork_id)?;
            flock_exclusive(&file, true)
                .with_context(|| format!("Failed to lock {}", path.display()))?;

            if still_linked(&path, &file)? {
                tracing::trace!(fork_id, "fork lock acquired");
                return Ok(Self { path, file });
            }
            tracing::trace!(fork_id, "lock file pruned while waiting, retrying");
        }
    }

    /// Try to acquire the lock without waiting
    ///
    /// Returns `Ok(None)` if another open handle currently holds it.
    pub fn try_acquire(layout: &Layout, fork_id: &str) -> Result<Option<Self>> {
        loop {
            let (path, file) = open_lock_file(layout, fork_id)?;
            if !flock_exclusive(&file, false)
                .with_context(|| format!("Failed to lock {}", path.display()))?
            {
                return Ok(None);
            }
            if still_linked(&path, &file)? {
                return Ok(Some(Self { path, file }));
            }
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove the lock files of forks for which `is_live` returns false
///
/// Files whose lock is held elsewhere, and names that are not valid fork ids,
/// are left alone. Returns the pruned fork ids in sorted order.
pub fn prune_locks(layout: &Layout, is_live: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let dir = layout.locks_dir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
    };

    let mut pruned = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(fork_id) = name.to_str().and_then(|n| n.strip_suffix(".lock")) else {
            continue;
        };
        if validate_fork_id(fork_id).is_err() || is_live(fork_id) {
            continue;
        }

        let Some(lock) = ForkLock::try_acquire(layout, fork_id)? else {
            tracing::debug!(fork_id, "lock in use, not pruning");
            continue;
        };
        // The fork may have been written before we got the lock
        if is_live(fork_id) {
            continue;
        }
        std::fs::remove_file(lock.path())
            .with_context(|| format!("Failed to remove {}", lock.path().display()))?;
        pruned.push(fork_id.to_string());
    }

    pruned.sort();
    Ok(pruned)
}

fn open_lock_file(layout: &Layout, fork_id: &str) -> Result<(PathBuf, File)> {
    let lock_path = layout.lock_path(fork_id);

    // Ensure locks directory exists
    std::fs::create_dir_all(layout.locks_dir()).context("Failed to create locks directory")?;

    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

    Ok((lock_path, file))
}

/// Take an exclusive file lock; `Ok(false)` means it is held elsewhere (non-blocking only)
#[cfg(unix)]
fn flock_exclusive(file: &File, blocking: bool) -> std::io::Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    let arg = if blocking {
        FlockArg::LockExclusive
    } else {
        FlockArg::LockExclusiveNonblock
    };

    match flock(file.as_raw_fd(), arg) {
        Ok(()) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Whether `file` is still the file at `path`
#[cfg(unix)]
fn still_linked(path: &Path, file: &File) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata().context("Failed to stat lock file")?;
    match std::fs::metadata(path) {
        Ok(current) => Ok(current.dev() == held.dev() && current.ino() == held.ino()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to stat {}", path.display())),
    }
}

#[cfg(not(unix))]
fn still_linked(_path: &Path, _file: &File) -> Result<bool> {
    Ok(true)
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File, _blocking: bool) -> std::io::Result<bool> {
    Ok(true)
}
