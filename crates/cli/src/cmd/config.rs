//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use crate::system_config::{self, SystemConfig, LOG_LEVELS};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Keys accepted by `--get` and `--set`
pub const KEYS: [&str; 4] = [
    "storage.root",
    "store.refresh_metadata_on_update",
    "store.index_on_import",
    "log.level",
];

/// List all configuration values
pub fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[storage]".yellow());
    match &config.storage.root {
        Some(root) => println!("  {} = {}", "root".cyan(), root),
        None => println!(
            "  {} = {}",
            "root".cyan(),
            "(default: ~/.claude-code/forks)".dimmed()
        ),
    }

    println!("\n{}", "[store]".yellow());
    println!(
        "  {} = {}",
        "refresh_metadata_on_update".cyan(),
        config.store.refresh_metadata_on_update
    );
    println!(
        "  {} = {}",
        "index_on_import".cyan(),
        config.store.index_on_import
    );

    println!("\n{}", "[log]".yellow());
    println!("  {} = {}", "level".cyan(), config.log.level);

    println!("\n{}", "Valid Values:".bold());
    println!("  log.level: {}", LOG_LEVELS.join(" | "));

    Ok(())
}

/// Get a single configuration value
pub fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown config key: {}. Available keys: {}",
        key,
        KEYS.join(", ")
    )
}

fn get_value(config: &SystemConfig, key: &str) -> Result<String> {
    let value = match key {
        "storage.root" => config.storage.root.clone().unwrap_or_default(),
        "store.refresh_metadata_on_update" => config.store.refresh_metadata_on_update.to_string(),
        "store.index_on_import" => config.store.index_on_import.to_string(),
        "log.level" => config.log.level.clone(),
        _ => return Err(unknown_key(key)),
    };
    Ok(value)
}

fn set_value(config: &mut SystemConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "storage.root" => {
            config.storage.root = Some(value.to_string());
        }
        "store.refresh_metadata_on_update" => {
            config.store.refresh_metadata_on_update = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "store.index_on_import" => {
            config.store.index_on_import = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "log.level" => {
            config.log.level = value.to_ascii_lowercase();
        }
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}
