//! Peer.Vote Core Library
//!
//! A minimal peer-to-peer ledger: an append-only chain of hash-linked
//! blocks, reconciled across peers with the longest-valid-chain rule.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod storage;
pub mod p2p;
pub mod rpc;
pub mod node;

/// Protocol constants - shared by every node on the network
pub mod constants {
    use std::time::Duration;

    /// Genesis block index
    pub const GENESIS_INDEX: u64 = 0;

    /// Sentinel previous hash carried by the genesis block
    pub const GENESIS_PREVIOUS_HASH: &str = "0";

    /// Genesis timestamp (Unix seconds)
    pub const GENESIS_TIMESTAMP: f64 = 1465154705.0;

    /// Genesis payload
    pub const GENESIS_DATA: &str = "let there be light.";

    /// Genesis hash, fixed by the network rather than recomputed
    pub const GENESIS_HASH: &str =
        "816534932c2b7154836da6afc367695e6337db8a921823784c14378abed4f7d7";

    /// Default HTTP control port
    pub const DEFAULT_HTTP_PORT: u16 = 3001;

    /// Default P2P port
    pub const DEFAULT_P2P_PORT: u16 = 6001;

    /// Maximum size of a single framed peer message (10 MB)
    pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

    /// Outbound messages queued per peer before the peer is considered stalled
    pub const PEER_QUEUE_CAPACITY: usize = 64;

    /// Default outbound connect timeout
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default per-message write timeout
    pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);
}
