//! Create, read, update and delete forks through the CLI

use crate::common::TestStore;
use crate::fy;
use anyhow::Result;
use serde_json::json;
use std::time::Duration;

#[test]
fn test_create_prints_checkpoint() -> Result<()> {
    let store = TestStore::new()?;

    let result = fy!(store, "create", "main").assert_success()?;
    let checkpoint = result.json()?;

    assert_eq!(checkpoint["fork_id"], "main");
    assert_eq!(checkpoint["parent_id"], json!(null));
    assert_eq!(checkpoint["conversation_history"], json!([]));
    assert_eq!(checkpoint["context"], json!({}));
    assert_eq!(checkpoint["metadata"], json!({"created_via": "cli"}));
    assert_eq!(checkpoint["version"], "0.1.0");
    assert!(checkpoint.get("last_modified").is_none());

    // What was printed is what was stored
    assert_eq!(store.read_checkpoint("main")?, checkpoint);
    assert!(store.root().join("main/metadata.json").is_file());
    Ok(())
}

#[test]
fn test_load_round_trips() -> Result<()> {
    let store = TestStore::new()?;

    let created = fy!(store, "create", "child", "parent").assert_success()?.json()?;
    let loaded = fy!(store, "load", "child").assert_success()?.json()?;

    assert_eq!(loaded, created);
    assert_eq!(loaded["parent_id"], "parent");
    Ok(())
}

#[test]
fn test_list_newest_first() -> Result<()> {
    let store = TestStore::new()?;
    assert_eq!(fy!(store, "list").assert_success()?.json()?, json!([]));

    for id in ["first", "second", "third"] {
        fy!(store, "create", id).assert_success()?;
        std::thread::sleep(Duration::from_millis(5));
    }

    let list = fy!(store, "list").assert_success()?.json()?;
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["fork_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["third", "second", "first"]);
    assert_eq!(list[0]["status"], "active");
    Ok(())
}

#[test]
fn test_update_then_load() -> Result<()> {
    let store = TestStore::new()?;
    let created = fy!(store, "create", "main").assert_success()?.json()?;

    let result = fy!(store, "update", "main", r#"{"metadata": {"x": 1}, "summary": "s"}"#)
        .assert_success()?;
    assert!(result.contains_stdout("Updated fork: main"));

    let loaded = fy!(store, "load", "main").assert_success()?.json()?;
    assert_eq!(loaded["metadata"], json!({"x": 1}));
    assert_eq!(loaded["summary"], "s");
    assert_eq!(loaded["timestamp"], created["timestamp"]);
    assert!(loaded["last_modified"].as_str().unwrap() > created["timestamp"].as_str().unwrap());

    // Metadata is left as created
    let meta = fy!(store, "meta", "main").assert_success()?.json()?;
    assert_eq!(meta["last_modified"], created["timestamp"]);
    Ok(())
}

#[test]
fn test_update_refreshes_metadata_when_configured() -> Result<()> {
    let store = TestStore::new()?;
    store.write_config("[store]\nrefresh_metadata_on_update = true\n")?;
    fy!(store, "create", "main").assert_success()?;

    fy!(store, "update", "main", r#"{"parent_id": "elsewhere"}"#).assert_success()?;

    let loaded = fy!(store, "load", "main").assert_success()?.json()?;
    let meta = fy!(store, "meta", "main").assert_success()?.json()?;
    assert_eq!(meta["parent_id"], "elsewhere");
    assert_eq!(meta["last_modified"], loaded["last_modified"]);
    Ok(())
}

#[test]
fn test_delete_removes_fork() -> Result<()> {
    let store = TestStore::new()?;
    fy!(store, "create", "doomed").assert_success()?;

    let result = fy!(store, "delete", "doomed").assert_success()?;
    assert!(result.contains_stdout("Deleted fork: doomed"));
    assert!(!store.root().join("doomed").exists());

    let result = fy!(store, "load", "doomed").assert_failure()?;
    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stdout("Error: Checkpoint not found for fork doomed"));
    Ok(())
}

#[test]
fn test_reindex_removes_locks_of_deleted_forks() -> Result<()> {
    let store = TestStore::new()?;
    fy!(store, "create", "kept").assert_success()?;
    fy!(store, "create", "doomed").assert_success()?;
    fy!(store, "delete", "doomed").assert_success()?;

    let locks = store.root().join(".locks");
    assert!(locks.join("doomed.lock").exists());

    let result = fy!(store, "reindex").assert_success()?;
    assert!(result.contains_stdout("All forks already indexed"));
    assert!(result.contains_stdout("Removed 1 stale lock file(s)"));
    assert!(!locks.join("doomed.lock").exists());
    assert!(locks.join("kept.lock").exists());

    let result = fy!(store, "reindex").assert_success()?;
    assert!(!result.contains_stdout("stale lock"));
    Ok(())
}

#[test]
fn test_tree_json_and_text() -> Result<()> {
    let store = TestStore::new()?;
    fy!(store, "create", "A").assert_success()?;
    fy!(store, "create", "B", "A").assert_success()?;
    fy!(store, "create", "C", "gone").assert_success()?;

    let tree = fy!(store, "tree", "--json").assert_success()?.json()?;
    assert_eq!(tree["root"]["metadata"], json!({}));

    let top = tree["root"]["children"].as_array().unwrap();
    let top_ids: Vec<&str> = top.iter().map(|n| n["fork_id"].as_str().unwrap()).collect();
    assert_eq!(top_ids.len(), 2);
    assert!(top_ids.contains(&"A") && top_ids.contains(&"C"));

    let a = top.iter().find(|n| n["fork_id"] == "A").unwrap();
    assert_eq!(a["children"][0]["fork_id"], "B");
    assert_eq!(a["children"][0]["metadata"]["parent_id"], "A");

    let text = fy!(store, "tree").assert_success()?;
    assert!(text.contains_stdout("└── "));
    assert!(text.contains_stdout("B"));
    assert!(text.contains_stdout("3 forks"));
    Ok(())
}

#[test]
fn test_tree_empty_store() -> Result<()> {
    let store = TestStore::new()?;
    let result = fy!(store, "tree").assert_success()?;
    assert!(result.contains_stdout("No forks"));
    Ok(())
}

#[test]
fn test_new_id_then_create() -> Result<()> {
    let store = TestStore::new()?;

    let result = fy!(store, "new-id", "parent").assert_success()?;
    let id = result.parse_fork_id().expect("no fork id printed");
    assert_eq!(result.stdout.trim(), id);

    fy!(store, "create", id.as_str(), "parent").assert_success()?;
    let meta = fy!(store, "meta", id.as_str()).assert_success()?.json()?;
    assert_eq!(meta["parent_id"], "parent");
    Ok(())
}
