//! Gitage - line-level git blame annotation
//!
//! Shows who last touched every line of a file and how long ago, with an
//! age heatmap and optional author avatars.

use anyhow::Result;
use clap::Parser;
use gitage::cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Parse CLI args and run
    let cli = cli::Cli::parse();
    cli::run(cli)
}
