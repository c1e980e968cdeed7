//! Command-line argument parsing.

use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;

use peervote::config::NodeConfig;

/// Peer.Vote ledger node.
#[derive(Parser, Debug, Clone)]
#[command(name = "peervote-node")]
#[command(about = "Peer.Vote - a blockchain for democratic governance")]
#[command(version)]
pub struct Cli {
    /// Interface to bind the HTTP and P2P listeners to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// HTTP control port.
    #[arg(long, env = "HTTP_PORT", default_value_t = 3001)]
    pub http_port: u16,

    /// P2P port.
    #[arg(long, env = "P2P_PORT", default_value_t = 6001)]
    pub p2p_port: u16,

    /// Comma-separated list of peers to connect to at startup.
    #[arg(long, env = "PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Outbound connect timeout in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    /// Per-message send timeout in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub send_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the node configuration.
    pub fn to_config(&self) -> NodeConfig {
        NodeConfig {
            bind: self.bind,
            http_port: self.http_port,
            p2p_port: self.p2p_port,
            initial_peers: self
                .peers
                .iter()
                .map(|peer| peer.trim().to_string())
                .filter(|peer| !peer.is_empty())
                .collect(),
            log_level: self.log_level.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }
}
