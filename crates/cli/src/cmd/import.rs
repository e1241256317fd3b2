//! Import a checkpoint file as a fork

use anyhow::Result;
use fy_store::CheckpointStore;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(store: &CheckpointStore, input: &Path, fork_id: Option<&str>) -> Result<()> {
    let fork_id = store.import_checkpoint(input, fork_id)?;

    println!("{} Imported checkpoint as fork: {}", "✓".green(), fork_id);
    if !store.options().index_on_import {
        println!(
            "{}",
            "Note: imported forks are not listed until indexed (fy reindex)".dimmed()
        );
    }
    Ok(())
}
