//! Node configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HTTP_PORT, DEFAULT_P2P_PORT, DEFAULT_SEND_TIMEOUT,
    MAX_MESSAGE_SIZE, PEER_QUEUE_CAPACITY,
};
use crate::p2p::P2pConfig;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Interface both listeners bind to.
    pub bind: IpAddr,

    /// HTTP control port.
    pub http_port: u16,

    /// P2P port.
    pub p2p_port: u16,

    /// Peers to connect to at startup.
    pub initial_peers: Vec<String>,

    /// Log level.
    pub log_level: String,

    /// Timeout for outbound connections.
    pub connect_timeout: Duration,

    /// Timeout for a single write to a peer.
    pub send_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: DEFAULT_HTTP_PORT,
            p2p_port: DEFAULT_P2P_PORT,
            initial_peers: Vec::new(),
            log_level: "info".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

impl NodeConfig {
    /// P2P listen address.
    pub fn p2p_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.p2p_port)
    }

    /// HTTP listen address.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.http_port)
    }

    /// Build the transport configuration.
    pub fn p2p_config(&self) -> P2pConfig {
        P2pConfig {
            connect_timeout: self.connect_timeout,
            send_timeout: self.send_timeout,
            max_message_size: MAX_MESSAGE_SIZE,
            queue_capacity: PEER_QUEUE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        let config = NodeConfig::default();
        assert_eq!(config.http_addr().port(), 3001);
        assert_eq!(config.p2p_addr().port(), 6001);
        assert!(config.initial_peers.is_empty());
    }

    #[test]
    fn test_p2p_config_carries_timeouts() {
        let config = NodeConfig {
            connect_timeout: Duration::from_millis(250),
            send_timeout: Duration::from_millis(750),
            ..NodeConfig::default()
        };
        let p2p = config.p2p_config();
        assert_eq!(p2p.connect_timeout, Duration::from_millis(250));
        assert_eq!(p2p.send_timeout, Duration::from_millis(750));
    }
}
