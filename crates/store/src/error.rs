//! Error types for checkpoint store operations
//!
//! Store methods return `anyhow::Result`; the rejections below are the ones a
//! caller may want to tell apart, and can be recovered with
//! `err.downcast_ref::<StoreError>()`. A missing fork is never an error.

use fy_core::InvalidForkId;
use std::path::PathBuf;
use thiserror::Error;

/// Domain rejections raised by [`CheckpointStore`](crate::CheckpointStore)
#[derive(Error, Debug)]
pub enum StoreError {
    /// Fork id cannot name a fork directory
    #[error(transparent)]
    InvalidForkId(#[from] InvalidForkId),

    /// Import source is not a usable checkpoint document
    #[error("Malformed checkpoint in {}: {reason}", .path.display())]
    MalformedCheckpoint { path: PathBuf, reason: String },

    /// Update would produce an invalid checkpoint
    #[error("Invalid update for fork {fork_id}: {reason}")]
    InvalidUpdate { fork_id: String, reason: String },
}
