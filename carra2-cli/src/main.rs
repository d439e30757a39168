//! CARRA2 stream maintenance CLI.
//!
//! # Usage
//!
//! ```text
//! carra2 periods [--prev periods_prev.txt] [--out periods.txt] [--archive-root <dir>]
//! carra2 fetch [--config streams.yml] [--stream <id>] [--dry-run] [--require-staging] [--json] [--strict]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{fetch::FetchArgs, periods::PeriodsArgs};

#[derive(Parser, Debug)]
#[command(
    name = "carra2",
    version,
    about = "Track archived periods and fetch yearly observations for CARRA2 streams",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite the period table from the archived tarballs of every stream.
    Periods(PeriodsArgs),

    /// Fetch next year's observations for streams that reached December.
    Fetch(FetchArgs),
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Periods(args) => args.run(),
        Commands::Fetch(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
