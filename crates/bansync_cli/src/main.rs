//! Bansync CLI
//!
//! Runs the ban sync engine against a JSON ban-list file standing in for a
//! host server.
//!
//! # Commands
//!
//! - `init-config` - Write the default configuration
//! - `dump` - Print the shared ban table
//! - `sync-once` - Run one bootstrap/reconcile cycle
//! - `run` - Run the sync loop until the engine unloads
//! - `ban` / `unban` - Change the local ban list and bridge the change

mod ban_file;
mod commands;

use bansync_core::IdentityId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Keep a local ban list in sync with a shared SQLite or MySQL table.
#[derive(Parser)]
#[command(name = "bansync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(global = true, short, long, default_value = "bansync.json")]
    config: PathBuf,

    /// Path to the local ban-list file
    #[arg(global = true, short, long, default_value = "bans.json")]
    bans: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the shared ban table
    Dump {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run one bootstrap/reconcile cycle and exit
    ///
    /// Every invocation starts from the ban file as it is now, and an existing
    /// shared table is authoritative: bans added to the file by hand since the
    /// last sync are lifted, not pushed. Use `ban` and `unban` to publish
    /// changes.
    SyncOnce,

    /// Run the sync loop until the engine unloads
    Run,

    /// Ban an identity locally and write it to the shared table
    Ban {
        /// Identity id (numeric or textual)
        id: IdentityId,
        /// Display name
        name: String,
        /// Ban reason, shown when the identity is disconnected
        #[arg(default_value = "")]
        reason: String,
    },

    /// Lift a local ban and delete it from the shared table
    Unban {
        /// Identity id (numeric or textual)
        id: IdentityId,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::InitConfig { force } => {
            commands::init_config::run(&cli.config, force)?;
        }
        Commands::Dump { format } => {
            commands::dump::run(&cli.config, &format)?;
        }
        Commands::SyncOnce => {
            commands::sync_once::run(&cli.config, &cli.bans)?;
        }
        Commands::Run => {
            commands::run::run(&cli.config, &cli.bans)?;
        }
        Commands::Ban { id, name, reason } => {
            commands::ban::ban(&cli.config, &cli.bans, id, name, reason)?;
        }
        Commands::Unban { id } => {
            commands::ban::unban(&cli.config, &cli.bans, &id)?;
        }
    }

    Ok(())
}
