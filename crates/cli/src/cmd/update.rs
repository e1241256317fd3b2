//! Merge JSON fields into a fork's checkpoint

use crate::util;
use anyhow::Result;
use fy_store::CheckpointStore;
use owo_colors::OwoColorize;

pub fn run(store: &CheckpointStore, fork_id: &str, updates: &str) -> Result<()> {
    let updates = util::parse_object(updates)?;

    if !store.update_checkpoint(fork_id, &updates)? {
        anyhow::bail!("Fork not found: {}", fork_id);
    }

    let mut keys: Vec<&str> = updates.keys().map(String::as_str).collect();
    keys.sort_unstable();
    println!(
        "{} Updated fork: {} {}",
        "✓".green(),
        fork_id,
        format!("({})", keys.join(", ")).dimmed()
    );
    Ok(())
}
