//! Demo driver for the ARSession interaction engine.
//!
//! Runs the lifecycle controllers against the simulated engine so the
//! state machines can be exercised and observed from a terminal.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "arsession", version, about = "ARSession interaction engine demo driver")]
struct Cli {
    /// Default log filter (RUST_LOG overrides).
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a capability report for a simulated device.
    Probe(commands::probe::ProbeArgs),
    /// Run a scripted placement session.
    Place(commands::place::PlaceArgs),
    /// Run a scripted image-target scan.
    Scan(commands::scan::ScanArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    arsession::telemetry::init_with_filter(&cli.log);

    let result = match cli.command {
        Command::Probe(args) => commands::probe::run(args).await,
        Command::Place(args) => commands::place::run(args).await,
        Command::Scan(args) => commands::scan::run(args).await,
    };

    if let Err(error) = result {
        tracing::error!(%error, "command failed");
        std::process::exit(1);
    }
}
