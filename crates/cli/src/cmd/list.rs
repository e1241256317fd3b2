//! List fork metadata, newest first

use crate::util;
use anyhow::Result;
use fy_store::CheckpointStore;

pub fn run(store: &CheckpointStore) -> Result<()> {
    let forks = store.list_forks()?;
    util::print_json(&forks)
}
