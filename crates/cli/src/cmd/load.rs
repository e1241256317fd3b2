//! Print a fork's checkpoint

use crate::util;
use anyhow::Result;
use fy_store::CheckpointStore;

pub fn run(store: &CheckpointStore, fork_id: &str) -> Result<()> {
    match store.load_checkpoint(fork_id)? {
        Some(checkpoint) => util::print_json(&checkpoint),
        None => anyhow::bail!("Checkpoint not found for fork {}", fork_id),
    }
}
