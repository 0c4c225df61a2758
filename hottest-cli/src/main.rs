//! Hottest: Jenkins configuration as code.
//!
//! # Usage
//!
//! ```text
//! hottest gen job -c <dir> -b <board chunk> -t <test chunk> [-l label] [-p file] [-o script|xml|metadata]
//! hottest gen node -c <dir> -b <board chunk> -n <name> [-p file] [-o xml|metadata]
//! hottest gen pipeline -f <file> [--root-folder <folder>] [-o script|xml|metadata]
//! hottest gen folder
//! hottest sync -f <sync file> [-I dir] [-m btnp] [-w regex] [--dry-run|--dry-run-xml|--dry-run-metadata|--dry-run-diff]
//! hottest revert -b <backup dir>
//! ```

mod commands;
mod config;
mod jenkins;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{gen::GenCommand, revert::RevertArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "hottest",
    version,
    about = "Generate Jenkins nodes, jobs and pipelines from chunks and keep a server in sync",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one generated artifact on stdout.
    Gen {
        #[command(subcommand)]
        command: GenCommand,
    },

    /// Create or update every item of a sync definition on the server.
    Sync(SyncArgs),

    /// Push a previous backup back to the server.
    Revert(RevertArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Gen { command } => commands::gen::run(command),
        Commands::Sync(args) => args.run(),
        Commands::Revert(args) => args.run(),
    }
}

/// Logs go to stderr; stdout is reserved for artifacts and dry-run dumps.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
