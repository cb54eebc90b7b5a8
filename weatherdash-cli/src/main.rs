//! Binary crate for the `weatherdash` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Drawing the dashboard in the terminal

use clap::Parser;

mod cli;
mod configure;
mod terminal;

/// Used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "weatherdash=info,weatherdash_core=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
