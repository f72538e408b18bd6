//! CLI entry point for photomosaic generation

use clap::Parser;
use photomosaic::io::cli::{Cli, CommandRunner};
use tracing_subscriber::EnvFilter;

fn main() -> photomosaic::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    CommandRunner::new(cli).run()
}
