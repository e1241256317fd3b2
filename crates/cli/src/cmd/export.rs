//! Export a checkpoint to a file

use anyhow::Result;
use fy_store::CheckpointStore;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(store: &CheckpointStore, fork_id: &str, output: &Path) -> Result<()> {
    if !store.export_checkpoint(fork_id, output)? {
        anyhow::bail!("Fork not found: {}", fork_id);
    }

    println!("{} Exported checkpoint to: {}", "✓".green(), output.display());
    Ok(())
}
