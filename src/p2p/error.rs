//! P2P error types.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// P2P-specific errors.
#[derive(Debug, Error)]
pub enum P2pError {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Payload could not be parsed into a message envelope.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Failed to serialize an outbound message.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Frame exceeds maximum allowed size.
    #[error("Message too large (max: {max} bytes)")]
    MessageTooLarge { max: usize },

    /// Outbound connection did not complete in time.
    #[error("Connection timeout to {addr} after {after:?}")]
    ConnectionTimeout { addr: String, after: Duration },

    /// Writing to a peer did not complete in time.
    #[error("Send timeout after {0:?}")]
    SendTimeout(Duration),

    /// Peer's outbound queue is full.
    #[error("Outbound queue full")]
    QueueFull,

    /// Peer closed the connection or is no longer registered.
    #[error("Peer disconnected: {reason}")]
    PeerDisconnected { reason: String },

    /// Peer address could not be used.
    #[error("Invalid peer address: {0}")]
    InvalidAddress(String),
}

impl P2pError {
    /// Whether this error should drop the connection.
    ///
    /// Errors confined to a single message (a malformed payload, one that
    /// fails to encode or is too large to send) leave the peer in place.
    pub fn is_transport_failure(&self) -> bool {
        !matches!(
            self,
            P2pError::Malformed(_) | P2pError::Serialization(_) | P2pError::MessageTooLarge { .. }
        )
    }
}

/// Result type for P2P operations.
pub type P2pResult<T> = Result<T, P2pError>;
