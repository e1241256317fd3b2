//! Delete a fork

use anyhow::Result;
use fy_store::CheckpointStore;
use owo_colors::OwoColorize;

pub fn run(store: &CheckpointStore, fork_id: &str) -> Result<()> {
    if !store.delete_fork(fork_id)? {
        anyhow::bail!("Fork not found: {}", fork_id);
    }

    println!("{} Deleted fork: {}", "✓".green(), fork_id);
    Ok(())
}
