//! Peer.Vote Node
//!
//! Main entry point for running a Peer.Vote node.

mod cli;

use tracing_subscriber::EnvFilter;

use peervote::node::Node;
use peervote::rpc::start_rpc_server;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();
    let config = cli.to_config();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!("Peer.Vote node v{}", env!("CARGO_PKG_VERSION"));

    let node = Node::new(config.p2p_config());

    node.connect_to_peers(&config.initial_peers).await;

    let (p2p_addr, _accept) = node.listen(config.p2p_addr()).await?;
    tracing::info!(addr = %p2p_addr, "P2P listener started");

    let http = tokio::spawn(start_rpc_server(node.clone(), config.http_addr()));

    tokio::select! {
        result = http => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(e) => return Err(e.into()),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping node");
        }
    }

    Ok(())
}
