// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Convey - conversation capture ingestion daemon.
//!
//! This is the binary entry point for the Convey daemon and CLI.

mod commands;
mod control;
mod runtime;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use convey_config::ConveyConfig;

/// Convey - process, store, and deliver captured AI conversations.
#[derive(Parser, Debug)]
#[command(name = "convey", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daemon, reading JSON control messages from stdin.
    Serve,
    /// Capture conversation records from JSON files and deliver them.
    Ingest {
        /// Files holding one record or an array of records.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Re-deliver every stored conversation.
    SyncAll,
    /// Show delivery statuses.
    Status {
        /// Only show this record.
        id: Option<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Remove conversations past the retention period.
    Cleanup,
    /// Show the effective configuration and stored sync settings.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<ConveyConfig, Vec<convey_config::ConfigError>> {
    match path {
        Some(path) => convey_config::load_and_validate_path(path),
        None => convey_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            convey_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    runtime::init_tracing(&config.daemon.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await.map(|()| 0),
        Some(Commands::Ingest { files }) => commands::run_ingest(&config, &files)
            .await
            .map(|failures| i32::from(failures > 0)),
        Some(Commands::SyncAll) => commands::run_sync_all(&config).await.map(|()| 0),
        Some(Commands::Status { id, json }) => commands::run_status(&config, id.as_deref(), json)
            .await
            .map(|()| 0),
        Some(Commands::Cleanup) => commands::run_cleanup(&config).await.map(|()| 0),
        Some(Commands::Config) => commands::run_config(&config).await.map(|()| 0),
        None => {
            println!("convey: use --help for available commands");
            Ok(0)
        }
    };

    // Exit explicitly: a pending stdin read would otherwise hold the runtime open.
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
