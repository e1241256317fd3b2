//! Write missing fork metadata and drop stale lock files

use anyhow::Result;
use fy_store::CheckpointStore;
use owo_colors::OwoColorize;

pub fn run(store: &CheckpointStore) -> Result<()> {
    let indexed = store.reindex()?;

    if indexed.is_empty() {
        println!("All forks already indexed");
    }
    for fork_id in &indexed {
        println!("{} Indexed fork: {}", "✓".green(), fork_id);
    }

    let pruned = store.prune_locks()?;
    if !pruned.is_empty() {
        println!("{} Removed {} stale lock file(s)", "✓".green(), pruned.len());
    }
    Ok(())
}
