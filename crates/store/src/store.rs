//! Directory-backed checkpoint store
//!
//! Each fork lives in its own directory under the store root, holding the
//! full checkpoint body and a small metadata record used for listing and
//! tree assembly. Writers hold the fork's advisory lock and replace files by
//! rename, so a reader sees either the previous or the next version of a file.

use crate::checkpoint::{Checkpoint, CheckpointPayload, ForkMetadata};
use crate::error::StoreError;
use crate::tree::ForkTree;
use anyhow::{Context, Result};
use fy_core::{atomic_write, validate_fork_id, ForkLock, Layout, StagedWrite};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Behaviour switches for keeping fork metadata in step with checkpoints
///
/// Both default to off: updates and imports only touch the checkpoint body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Rewrite metadata `last_modified`/`parent_id` after every update
    pub refresh_metadata_on_update: bool,
    /// Write fork metadata for imported checkpoints
    pub index_on_import: bool,
}

/// Checkpoint store rooted at one directory
pub struct CheckpointStore {
    layout: Layout,
    options: StoreOptions,
}

impl CheckpointStore {
    /// Open (or create) a store at `root` with default options
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = Layout::open(root)?;
        debug!(root = %layout.root().display(), "opened checkpoint store");
        Ok(Self {
            layout,
            options: StoreOptions::default(),
        })
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Generate a fork id from `parent_id` and the current time
    pub fn generate_fork_id(&self, parent_id: Option<&str>) -> String {
        fy_core::generate_fork_id(parent_id)
    }

    /// Whether a checkpoint body exists for `fork_id`
    pub fn exists(&self, fork_id: &str) -> Result<bool> {
        check_id(fork_id)?;
        Ok(self.layout.checkpoint_path(fork_id).is_file())
    }

    /// Create a checkpoint and its fork metadata
    ///
    /// An existing fork with the same id is overwritten. Both files are
    /// staged before either is renamed into place, checkpoint first.
    pub fn create_checkpoint(
        &self,
        fork_id: &str,
        parent_id: Option<&str>,
        payload: CheckpointPayload,
    ) -> Result<Checkpoint> {
        check_id(fork_id)?;
        let _lock = ForkLock::acquire(&self.layout, fork_id)?;

        let checkpoint = Checkpoint::new(fork_id, parent_id, payload);
        let metadata = ForkMetadata::from_checkpoint(&checkpoint);

        self.ensure_fork_dir(fork_id)?;
        let body = StagedWrite::stage(&self.layout.checkpoint_path(fork_id), &to_json(&checkpoint)?)?;
        let meta = StagedWrite::stage(&self.layout.metadata_path(fork_id), &to_json(&metadata)?)?;
        body.commit()?;
        meta.commit()?;

        info!(fork_id, parent_id = ?parent_id, "created checkpoint");
        Ok(checkpoint)
    }

    /// Load a checkpoint; `Ok(None)` if the fork does not exist
    pub fn load_checkpoint(&self, fork_id: &str) -> Result<Option<Checkpoint>> {
        check_id(fork_id)?;
        read_json(&self.layout.checkpoint_path(fork_id))
    }

    /// Shallow-merge `updates` into a stored checkpoint
    ///
    /// Returns `Ok(false)` when the fork does not exist.
    pub fn update_checkpoint(&self, fork_id: &str, updates: &Map<String, Value>) -> Result<bool> {
        check_id(fork_id)?;
        let _lock = ForkLock::acquire(&self.layout, fork_id)?;

        let Some(current) = self.load_checkpoint(fork_id)? else {
            debug!(fork_id, "update skipped: no such fork");
            return Ok(false);
        };

        let updated = current.merged(updates, &fy_core::now_iso())?;
        atomic_write(&self.layout.checkpoint_path(fork_id), &to_json(&updated)?)?;

        if self.options.refresh_metadata_on_update {
            let mut metadata = self
                .read_metadata_lenient(fork_id)
                .unwrap_or_else(|| ForkMetadata::from_checkpoint(&updated));
            metadata.parent_id = updated.parent_id.clone();
            if let Some(last_modified) = &updated.last_modified {
                metadata.last_modified = last_modified.clone();
            }
            self.write_metadata(&metadata)?;
        }

        info!(fork_id, keys = updates.len(), "updated checkpoint");
        Ok(true)
    }

    /// Fork metadata; `Ok(None)` if the fork has none
    pub fn get_metadata(&self, fork_id: &str) -> Result<Option<ForkMetadata>> {
        check_id(fork_id)?;
        read_json(&self.layout.metadata_path(fork_id))
    }

    /// Metadata of every fork, newest `created_at` first
    ///
    /// Fork directories with missing or unreadable metadata are skipped.
    pub fn list_forks(&self) -> Result<Vec<ForkMetadata>> {
        let mut forks = Vec::new();

        for name in self.layout.fork_dirs()? {
            let path = self.layout.metadata_path(&name);
            match read_json::<ForkMetadata>(&path) {
                Ok(Some(metadata)) => forks.push(metadata),
                Ok(None) => debug!(fork_id = %name, "no metadata, skipping"),
                Err(e) => {
                    let error = format!("{:#}", e);
                    warn!(fork_id = %name, %error, "unreadable metadata, skipping");
                }
            }
        }

        forks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.fork_id.cmp(&b.fork_id))
        });
        Ok(forks)
    }

    /// Rebuild the fork tree from current metadata
    pub fn get_fork_tree(&self) -> Result<ForkTree> {
        Ok(ForkTree::from_metadata(self.list_forks()?))
    }

    /// Remove a fork and everything stored under it
    ///
    /// Returns `Ok(false)` without side effects when the fork does not exist.
    /// Child forks are left alone.
    pub fn delete_fork(&self, fork_id: &str) -> Result<bool> {
        check_id(fork_id)?;
        let _lock = ForkLock::acquire(&self.layout, fork_id)?;

        let dir = self.layout.fork_dir(fork_id);
        if !dir.is_dir() {
            debug!(fork_id, "delete skipped: no such fork");
            return Ok(false);
        }

        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove {}", dir.display()))?;

        info!(fork_id, path = %dir.display(), "deleted fork");
        Ok(true)
    }

    /// Copy a checkpoint body verbatim to `destination`
    ///
    /// Returns `Ok(false)` when the fork does not exist.
    pub fn export_checkpoint(&self, fork_id: &str, destination: &Path) -> Result<bool> {
        check_id(fork_id)?;

        let source = self.layout.checkpoint_path(fork_id);
        let bytes = match std::fs::read(&source) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", source.display()))
            }
        };

        atomic_write(destination, &bytes)
            .with_context(|| format!("Failed to export to {}", destination.display()))?;

        info!(fork_id, path = %destination.display(), "exported checkpoint");
        Ok(true)
    }

    /// Store the checkpoint in `source` under `fork_id`, or under a freshly
    /// generated id when none is given
    ///
    /// A generated id is seeded by the body's `parent_id`. The body is stored
    /// as found apart from its `fork_id`, which is replaced. Any JSON object
    /// is accepted. An existing fork with the target id is overwritten.
    pub fn import_checkpoint(&self, source: &Path, fork_id: Option<&str>) -> Result<String> {
        let bytes = std::fs::read(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;

        let malformed = |reason: String| StoreError::MalformedCheckpoint {
            path: source.to_path_buf(),
            reason,
        };

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| malformed(e.to_string()))?;
        let Value::Object(mut body) = value else {
            return Err(malformed("expected a JSON object".to_string()).into());
        };

        let fork_id = match fork_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let parent = body.get("parent_id").and_then(Value::as_str);
                fy_core::generate_fork_id(parent)
            }
        };
        check_id(&fork_id)?;

        body.insert("fork_id".to_string(), Value::String(fork_id.clone()));

        let _lock = ForkLock::acquire(&self.layout, &fork_id)?;
        self.ensure_fork_dir(&fork_id)?;
        atomic_write(&self.layout.checkpoint_path(&fork_id), &to_json(&body)?)?;

        if self.options.index_on_import {
            let checkpoint = Checkpoint::from_map(body);
            self.write_metadata(&ForkMetadata::from_checkpoint(&checkpoint))?;
        }

        info!(fork_id = %fork_id, source = %source.display(), "imported checkpoint");
        Ok(fork_id)
    }

    /// Derive fork metadata from the stored checkpoint body
    ///
    /// An existing record's `status` is kept. Returns `Ok(false)` when the
    /// fork has no checkpoint.
    pub fn rebuild_metadata(&self, fork_id: &str) -> Result<bool> {
        check_id(fork_id)?;
        let _lock = ForkLock::acquire(&self.layout, fork_id)?;

        let Some(checkpoint) = self.load_checkpoint(fork_id)? else {
            return Ok(false);
        };

        let mut metadata = ForkMetadata::from_checkpoint(&checkpoint);
        if let Some(last_modified) = &checkpoint.last_modified {
            metadata.last_modified = last_modified.clone();
        }
        if let Some(existing) = self.read_metadata_lenient(fork_id) {
            metadata.status = existing.status;
        }
        self.write_metadata(&metadata)?;

        info!(fork_id, "rebuilt fork metadata");
        Ok(true)
    }

    /// Write metadata for every fork that has a checkpoint but no readable
    /// metadata; returns the ids indexed, sorted
    pub fn reindex(&self) -> Result<Vec<String>> {
        let mut indexed = Vec::new();

        for name in self.layout.fork_dirs()? {
            if validate_fork_id(&name).is_err()
                || !self.layout.checkpoint_path(&name).is_file()
                || self.read_metadata_lenient(&name).is_some()
            {
                continue;
            }

            match self.rebuild_metadata(&name) {
                Ok(true) => indexed.push(name),
                Ok(false) => {}
                Err(e) => {
                    let error = format!("{:#}", e);
                    warn!(fork_id = %name, %error, "cannot index fork");
                }
            }
        }

        indexed.sort();
        info!(count = indexed.len(), "reindexed forks");
        Ok(indexed)
    }

    /// Remove lock files left behind by deleted forks
    ///
    /// Returns the ids whose lock files were removed. Locks in use are kept.
    pub fn prune_locks(&self) -> Result<Vec<String>> {
        let pruned = fy_core::prune_locks(&self.layout, |id| self.layout.fork_dir(id).is_dir())?;
        debug!(count = pruned.len(), "pruned lock files");
        Ok(pruned)
    }

    fn ensure_fork_dir(&self, fork_id: &str) -> Result<()> {
        let dir = self.layout.fork_dir(fork_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create fork directory {}", dir.display()))
    }

    fn write_metadata(&self, metadata: &ForkMetadata) -> Result<()> {
        atomic_write(&self.layout.metadata_path(&metadata.fork_id), &to_json(metadata)?)
    }

    /// Existing metadata, treating unreadable records as absent
    fn read_metadata_lenient(&self, fork_id: &str) -> Option<ForkMetadata> {
        match read_json(&self.layout.metadata_path(fork_id)) {
            Ok(metadata) => metadata,
            Err(e) => {
                let error = format!("{:#}", e);
                debug!(fork_id, %error, "ignoring unreadable metadata");
                None
            }
        }
    }
}

fn check_id(fork_id: &str) -> Result<()> {
    validate_fork_id(fork_id).map_err(StoreError::from)?;
    Ok(())
}

/// Pretty JSON with 2-space indentation
fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).context("Failed to serialize JSON")
}

/// Read and parse a JSON file; `Ok(None)` if it does not exist
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
}
