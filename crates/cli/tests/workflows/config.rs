//! `fy config` and config-driven store selection

use crate::common::TestStore;
use anyhow::Result;

#[test]
fn test_path_and_create() -> Result<()> {
    let store = TestStore::new()?;
    let config_path = store.config_path();

    let result = store
        .command_without_root()
        .args(&["config", "--path"])
        .assert_success()?;
    assert!(result.contains_stdout(&config_path.display().to_string()));
    assert!(result.contains_stdout("does not exist"));

    store
        .command_without_root()
        .args(&["config", "--path", "--create"])
        .assert_success()?;
    let written = std::fs::read_to_string(&config_path)?;
    assert!(written.contains("[log]"));

    // Creating again leaves the file alone
    store.write_config("[log]\nlevel = \"info\"\n")?;
    store
        .command_without_root()
        .args(&["config", "--path", "--create"])
        .assert_success()?;
    assert!(std::fs::read_to_string(&config_path)?.contains("info"));
    Ok(())
}

#[test]
fn test_set_then_get() -> Result<()> {
    let store = TestStore::new()?;

    store
        .command_without_root()
        .args(&["config", "--set", "log.level", "debug"])
        .assert_success()?;
    let result = store
        .command_without_root()
        .args(&["config", "--get", "log.level"])
        .assert_success()?;
    assert_eq!(result.stdout.trim(), "debug");

    let result = store
        .command_without_root()
        .args(&["config", "--set", "log.level", "noisy"])
        .assert_failure()?;
    assert!(result.contains_stdout("Error: Invalid configuration value"));

    let result = store
        .command_without_root()
        .args(&["config", "--get", "daemon.interval"])
        .assert_failure()?;
    assert!(result.contains_stdout("Unknown config key"));
    Ok(())
}

#[test]
fn test_storage_root_from_config() -> Result<()> {
    let store = TestStore::new()?;
    let configured = store.path().join("configured-root");

    store
        .command_without_root()
        .args(&["config", "--set", "storage.root", configured.to_str().unwrap()])
        .assert_success()?;

    store
        .command_without_root()
        .args(&["create", "via-config"])
        .assert_success()?;
    assert!(configured.join("via-config/checkpoint.json").is_file());

    // --root wins over config
    store.command().args(&["create", "via-flag"]).assert_success()?;
    assert!(store.root().join("via-flag/checkpoint.json").is_file());
    assert!(!configured.join("via-flag").exists());
    Ok(())
}

#[test]
fn test_list_and_example() -> Result<()> {
    let store = TestStore::new()?;

    let result = store
        .command_without_root()
        .args(&["config"])
        .assert_success()?;
    assert!(result.contains_stdout("[storage]"));
    assert!(result.contains_stdout("index_on_import"));

    let result = store
        .command_without_root()
        .args(&["config", "--example"])
        .assert_success()?;
    assert!(result.contains_stdout("refresh_metadata_on_update = false"));
    Ok(())
}

#[test]
fn test_broken_config_fails_store_commands() -> Result<()> {
    let store = TestStore::new()?;
    store.write_config("[log]\nlevel = \"chatty\"\n")?;

    let result = store.command().args(&["list"]).assert_failure()?;
    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stdout("Invalid config file"));
    Ok(())
}
