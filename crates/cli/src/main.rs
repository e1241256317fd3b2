//! fork-yeah CLI - fy command

use anyhow::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

mod cmd;
mod system_config;
mod util;

/// fork-yeah - Checkpoints for branching conversations
#[derive(Parser)]
#[command(name = "fy")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Fork store directory (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a checkpoint and print it
    Create {
        /// Fork ID
        fork_id: String,
        /// Parent fork ID
        parent_id: Option<String>,
    },
    /// Print a checkpoint
    Load {
        /// Fork ID
        fork_id: String,
    },
    /// List fork metadata, newest first
    List,
    /// Delete a fork
    Delete {
        /// Fork ID
        fork_id: String,
    },
    /// Write a checkpoint to a file
    Export {
        /// Fork ID
        fork_id: String,
        /// Destination file
        output_file: PathBuf,
    },
    /// Import a checkpoint file as a fork
    Import {
        /// Checkpoint file
        input_file: PathBuf,
        /// Fork ID to store it under (default: generated)
        fork_id: Option<String>,
    },
    /// Merge a JSON object into a checkpoint
    Update {
        /// Fork ID
        fork_id: String,
        /// JSON object; each key replaces the field of the same name
        updates: String,
    },
    /// Print a fork's metadata
    Meta {
        /// Fork ID
        fork_id: String,
    },
    /// Show the fork tree
    Tree {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a fork ID
    NewId {
        /// Parent fork ID to seed the ID with
        parent_id: Option<String>,
    },
    /// Write metadata for forks that have none and remove stale lock files
    Reindex,
    /// View or edit configuration
    #[command(group(ArgGroup::new("action").args(["list", "get", "set", "path", "example"])))]
    Config {
        /// List all values (default)
        #[arg(long)]
        list: bool,
        /// Print one value
        #[arg(long, value_name = "KEY")]
        get: Option<String>,
        /// Set one value
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
        set: Option<Vec<String>>,
        /// Print the config file path
        #[arg(long)]
        path: bool,
        /// With --path, create the file if missing
        #[arg(long, requires = "path")]
        create: bool,
        /// Print an example config
        #[arg(long)]
        example: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage and help both go to stdout
            print!("{}", e.render());
            return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2));
        }
    };

    let config = system_config::load();
    let configured = config
        .as_ref()
        .ok()
        .and_then(|c| c.log.level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);
    init_tracing(cli.verbose, cli.quiet, configured);

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; stdout carries command output
fn init_tracing(verbose: u8, quiet: bool, configured: Level) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => configured,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, config: Result<system_config::SystemConfig>) -> Result<()> {
    let store = |config: system_config::SystemConfig| util::open_store(cli.root.as_deref(), &config);

    match cli.command {
        Commands::Config { list, get, set, path, create, example } => {
            if list {
                cmd::config::run_list()
            } else if let Some(key) = get {
                cmd::config::run_get(&key)
            } else if let Some(pair) = set {
                match pair.as_slice() {
                    [key, value] => cmd::config::run_set(key, value),
                    _ => anyhow::bail!("--set takes a key and a value"),
                }
            } else if path {
                cmd::config::run_path(create)
            } else if example {
                cmd::config::run_example()
            } else {
                cmd::config::run_list()
            }
        }
        Commands::NewId { parent_id } => cmd::new_id::run(parent_id.as_deref()),
        Commands::Create { fork_id, parent_id } => {
            cmd::create::run(&store(config?)?, &fork_id, parent_id.as_deref())
        }
        Commands::Load { fork_id } => cmd::load::run(&store(config?)?, &fork_id),
        Commands::List => cmd::list::run(&store(config?)?),
        Commands::Delete { fork_id } => cmd::delete::run(&store(config?)?, &fork_id),
        Commands::Export { fork_id, output_file } => {
            cmd::export::run(&store(config?)?, &fork_id, &output_file)
        }
        Commands::Import { input_file, fork_id } => {
            cmd::import::run(&store(config?)?, &input_file, fork_id.as_deref())
        }
        Commands::Update { fork_id, updates } => {
            cmd::update::run(&store(config?)?, &fork_id, &updates)
        }
        Commands::Meta { fork_id } => cmd::meta::run(&store(config?)?, &fork_id),
        Commands::Tree { json } => cmd::tree::run(&store(config?)?, json),
        Commands::Reindex => cmd::reindex::run(&store(config?)?),
    }
}
