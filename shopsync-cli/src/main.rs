//! shopsync — scheduled catalog reconciliation CLI.
//!
//! # Usage
//!
//! ```text
//! shopsync run [--dry-run] [--max-failures N] [--json]
//! shopsync diff [--json]
//! ```
//!
//! Configuration comes from the environment: `SHOP_URL`, `SHOP_TOKEN`,
//! `LOCATION_ID`, `SUBFAMILIAS`, `PUBLICATION_ID` (required), `FEED_URL`
//! and `SHOP_CA_BUNDLE` (optional). The scheduler invokes `shopsync run`
//! on a fixed cadence; every run is stateless and idempotent.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, run::RunArgs};

#[derive(Parser, Debug)]
#[command(
    name = "shopsync",
    version,
    about = "Reconcile the local product feed against the shop catalog",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch both catalogs, diff them and apply the changes.
    Run(RunArgs),

    /// Show what a run would change without applying anything.
    Diff(DiffArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
