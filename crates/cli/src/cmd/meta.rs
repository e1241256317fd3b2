//! Print a fork's metadata record

use crate::util;
use anyhow::Result;
use fy_store::CheckpointStore;

pub fn run(store: &CheckpointStore, fork_id: &str) -> Result<()> {
    match store.get_metadata(fork_id)? {
        Some(metadata) => util::print_json(&metadata),
        None => anyhow::bail!("No metadata for fork {}", fork_id),
    }
}
