//! `parcel` entry point.

use clap::Parser;
use parcel_cli::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = parcel_store::VERSION, command = ?cli.command, "parcel starting");

    if let Err(err) = cli.run() {
        eprintln!("error: {err:#}");
        std::process::exit(parcel_cli::exit_code(&err));
    }
}
