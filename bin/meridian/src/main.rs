//! Meridian swarm discovery node binary.

mod cli;

use clap::Parser;
use meridian_node_core::logging::init_logging;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = cli::MeridianCli::parse();
    init_logging(&cli.logs)?;

    cli.command.run().await
}
