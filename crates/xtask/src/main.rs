//! Development tasks for the kingdom workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{DeterminismGuard, ReadJournal};

/// Development tasks for the kingdom workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the kingdom simulation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Reject wall clocks, unseeded randomness and unordered maps in kingdom-core
    DeterminismGuard(DeterminismGuard),

    /// Read and summarize a decision journal
    ReadJournal(ReadJournal),
}

fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::DeterminismGuard(cmd) => cmd.execute(),
        Command::ReadJournal(cmd) => cmd.execute(),
    }
}
