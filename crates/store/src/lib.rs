//! Checkpoint model and directory-backed store for fork-yeah
//!
//! This crate provides:
//! - Checkpoint and fork metadata records (JSON on disk)
//! - `CheckpointStore`: create/load/update/delete/export/import
//! - Fork tree assembly from flat metadata

pub mod checkpoint;
pub mod error;
pub mod store;
pub mod tree;

// Re-exports
pub use checkpoint::{Checkpoint, CheckpointPayload, ForkMetadata, SCHEMA_VERSION, STATUS_ACTIVE};
pub use error::StoreError;
pub use store::{CheckpointStore, StoreOptions};
pub use tree::{ForkNode, ForkTree, RootNode};

/// Result type for store operations
pub type Result<T> = anyhow::Result<T>;
