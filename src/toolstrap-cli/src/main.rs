//! Toolstrap CLI - Main entry point.

use anyhow::Result;
use clap::Parser;

use toolstrap_cli::cli::{Cli, dispatch_command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    toolstrap_cli::logging::init(cli.log_level);

    dispatch_command(cli).await
}
