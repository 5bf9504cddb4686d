//! Vortex RDMA cgroup CLI
//!
//! Applies RDMA device limits to a cgroup and reads them back.

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // RUST_LOG wins, otherwise verbosity decides
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute the command
    if let Err(e) = commands::dispatch(cli).await {
        eprintln!("❌ Error: {e:#}");
        process::exit(1);
    }
}
