//! Create a checkpoint for a fork

use crate::util;
use anyhow::Result;
use fy_store::{CheckpointPayload, CheckpointStore};
use serde_json::{Map, Value};

pub fn run(store: &CheckpointStore, fork_id: &str, parent_id: Option<&str>) -> Result<()> {
    let mut metadata = Map::new();
    metadata.insert("created_via".to_string(), Value::String("cli".to_string()));

    let payload = CheckpointPayload::default().with_metadata(metadata);
    let checkpoint = store.create_checkpoint(fork_id, parent_id, payload)?;

    util::print_json(&checkpoint)
}
