//! mongosnap - scheduled MongoDB snapshots
//!
//! Exports every user database to line-delimited JSON under a timestamped
//! directory, lists existing snapshots, and restores one on demand.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mongosnap_core::{init_logging, SnapshotConfig, SnapshotManager, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use tracing::{error, info};

mod commands;
mod service;

use commands::{execute_create, execute_list, execute_restore};

#[derive(Parser)]
#[command(name = "mongosnap")]
#[command(about = "MongoDB snapshot manager")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Action to perform (defaults to `service`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daily snapshot service until interrupted
    Service,
    /// Create a snapshot now
    Create,
    /// Restore a snapshot, replacing the contents of its collections
    Restore {
        /// Snapshot name, e.g. 20240415_020000
        #[arg(short, long)]
        snapshot: String,
    },
    /// List available snapshots, newest first
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SnapshotConfig::load(&cli.config)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)?;

    info!("Backup directory: {}", config.backup_dir.display());

    let manager = SnapshotManager::connect(config).await.map_err(|e| {
        error!("Failed to create snapshot manager: {}", e);
        e
    })?;

    let result = match cli.command.unwrap_or(Commands::Service) {
        Commands::Service => service::run(&manager).await,
        Commands::Create => execute_create(&manager).await,
        Commands::Restore { snapshot } => execute_restore(&manager, &snapshot).await,
        Commands::List => execute_list(&manager).await,
    };

    if let Err(e) = manager.close().await {
        error!("Failed to close connection: {}", e);
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e)
        }
    }
}
