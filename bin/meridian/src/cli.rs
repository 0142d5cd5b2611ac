//! Meridian CLI entry point.

use std::path::PathBuf;

use alloy_primitives::{B256, U256};
use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr, bail};
use meridian_node_core::{LogArgs, NodeConfig, SwarmNode};
use meridian_swarm_api::CancellationToken;
use meridian_swarm_peer::{EcdsaSigner, Multiaddr};
use meridian_swarm_rpc::LoopbackNetwork;
use tracing::{info, warn};

/// First loopback port handed to simulated nodes.
const BASE_PORT: u16 = 18514;

/// Meridian - swarm peer discovery
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct MeridianCli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run an in-process network of discovery nodes.
    Simulate(SimulateArgs),
    /// Print the effective configuration as TOML.
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub(crate) struct SimulateArgs {
    /// Number of nodes to start.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..=1024))]
    nodes: u16,

    /// Path to a TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Nonce of every node's initial address record.
    #[arg(long, default_value_t = 1)]
    seed_nonce: u64,
}

#[derive(Debug, Args)]
pub(crate) struct ConfigArgs {
    /// Path to a TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Commands {
    pub(crate) async fn run(self) -> Result<()> {
        match self {
            Self::Simulate(args) => simulate(args).await,
            Self::Config(args) => {
                let config = NodeConfig::load(args.config.as_deref())
                    .wrap_err("failed to load configuration")?;
                print!("{}", config.to_toml_string()?);
                Ok(())
            }
        }
    }
}

/// Deterministic identity for the simulated node at `index`.
fn node_signer(index: u16) -> Result<EcdsaSigner> {
    let secret = B256::from(U256::from(u64::from(index) + 1));
    EcdsaSigner::from_secret(secret.0).wrap_err_with(|| format!("invalid key for node {index}"))
}

async fn simulate(args: SimulateArgs) -> Result<()> {
    let config =
        NodeConfig::load(args.config.as_deref()).wrap_err("failed to load configuration")?;
    let network = LoopbackNetwork::new();

    let mut nodes = Vec::with_capacity(usize::from(args.nodes));
    for index in 0..args.nodes {
        let port = BASE_PORT
            .checked_add(index)
            .ok_or_else(|| eyre::eyre!("port range exhausted at node {index}"))?;
        let transport: Multiaddr = format!("/ip4/127.0.0.1/tcp/{port}").parse()?;
        let node = SwarmNode::builder(&config, node_signer(index)?, transport)
            .with_nonce(args.seed_nonce)
            .build(&network)?;
        nodes.push(node);
    }

    let (Some(bootnode), Some(querier)) = (nodes.first(), nodes.last()) else {
        bail!("simulation needs at least one node");
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    for node in nodes.iter().skip(1) {
        if let Err(err) = node.ping(&cancel, bootnode.address()).await {
            warn!(from = %node.address(), %err, "ping to bootnode failed");
        }
    }
    let known = bootnode
        .known_peers()
        .wrap_err("failed to count bootnode peers")?;
    info!(known, "bootnode populated");

    for node in &nodes {
        match querier.query(&cancel, bootnode.address(), &node.identifier()).await {
            Ok(closest) => {
                let closest: Vec<String> =
                    closest.iter().map(|r| r.identifier().to_string()).collect();
                info!(peer = %node.identifier(), ?closest, "closest peers");
            }
            Err(err) if err.is_cancelled() => {
                info!("simulation interrupted");
                break;
            }
            Err(err) => warn!(peer = %node.identifier(), %err, "query failed"),
        }
    }

    info!(
        nodes = nodes.len(),
        dials = network.dials(),
        requests = network.requests(),
        open_connections = network.open_connections(),
        "simulation complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use meridian_swarm_peer::AddressSigner;

    use super::*;

    #[test]
    fn test_cli_definition() {
        MeridianCli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = MeridianCli::parse_from(["meridian", "-v", "simulate", "--nodes", "3", "--seed-nonce", "4"]);
        assert_eq!(cli.logs.verbosity, 1);
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.nodes, 3);
        assert_eq!(args.seed_nonce, 4);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_signers_are_distinct() {
        let a = node_signer(0).unwrap();
        let b = node_signer(1).unwrap();
        assert_ne!(a.identifier(), b.identifier());
    }

    #[tokio::test]
    async fn test_simulation_runs() {
        let args = SimulateArgs {
            nodes: 4,
            config: None,
            seed_nonce: 2,
        };
        simulate(args).await.unwrap();
    }
}
