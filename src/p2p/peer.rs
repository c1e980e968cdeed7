//! Peer registry
//!
//! Tracks live peer connections and provides point-to-point and broadcast
//! send. Each peer owns a bounded outbound queue drained by its own writer
//! task, so enqueueing never blocks and one slow peer cannot stall delivery
//! to the others. A peer whose queue is full or closed is dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::p2p::{Message, P2pError, P2pResult};

/// Registry-assigned peer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Which side opened the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDirection {
    Inbound,
    Outbound,
}

/// Information about a registered peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Registry identifier
    pub id: PeerId,
    /// Remote address, for diagnostics
    pub addr: SocketAddr,
    /// Connection direction
    pub direction: ConnectionDirection,
}

struct PeerHandle {
    info: PeerInfo,
    outbound: mpsc::Sender<Message>,
}

/// Set of live peer connections
#[derive(Default)]
pub struct PeerRegistry {
    peers: RwLock<BTreeMap<PeerId, PeerHandle>>,
    next_id: AtomicU64,
}

impl PeerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection and send it the `QueryLatest` handshake probe.
    ///
    /// `outbound` is the sending side of the peer's writer queue.
    pub fn register(
        &self,
        addr: SocketAddr,
        direction: ConnectionDirection,
        outbound: mpsc::Sender<Message>,
    ) -> PeerInfo {
        let id = PeerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let info = PeerInfo { id, addr, direction };

        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, PeerHandle { info: info.clone(), outbound });
        info!(peer = %id, addr = %addr, ?direction, "Peer registered");

        // Failure here already unregistered the peer
        let _ = self.send(id, Message::QueryLatest);
        info
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn unregister(&self, id: PeerId) -> bool {
        let removed = self
            .peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match removed {
            Some(handle) => {
                info!(peer = %id, addr = %handle.info.addr, "Peer removed");
                true
            }
            None => false,
        }
    }

    /// Queue `message` for one peer; a failed peer is unregistered
    pub fn send(&self, id: PeerId, message: Message) -> P2pResult<()> {
        let outbound = {
            let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
            match peers.get(&id) {
                Some(handle) => handle.outbound.clone(),
                None => {
                    return Err(P2pError::PeerDisconnected {
                        reason: format!("{} not registered", id),
                    })
                }
            }
        };

        debug!(peer = %id, command = message.command(), "Sending message");
        match outbound.try_send(message) {
            Ok(()) => Ok(()),
            Err(e) => {
                let error = match e {
                    TrySendError::Full(_) => P2pError::QueueFull,
                    TrySendError::Closed(_) => P2pError::PeerDisconnected {
                        reason: "writer closed".into(),
                    },
                };
                warn!(peer = %id, error = %error, "Send failed, dropping peer");
                self.unregister(id);
                Err(error)
            }
        }
    }

    /// Queue `message` for every registered peer.
    ///
    /// Works on a snapshot of the peer set; failures only remove the
    /// failing peer. Returns the number of peers the message was queued for.
    pub fn broadcast(&self, message: &Message) -> usize {
        let ids: Vec<PeerId> = self
            .peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();

        ids.into_iter()
            .filter(|id| self.send(*id, message.clone()).is_ok())
            .count()
    }

    /// Information about every registered peer, in registration order
    pub fn peers(&self) -> Vec<PeerInfo> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|handle| handle.info.clone())
            .collect()
    }

    /// Remote addresses of every registered peer
    pub fn addresses(&self) -> Vec<SocketAddr> {
        self.peers().into_iter().map(|info| info.addr).collect()
    }

    /// Check whether a peer is registered
    pub fn contains(&self, id: PeerId) -> bool {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Number of registered peers
    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check whether no peers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::genesis_block;

    fn make_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn test_register_sends_handshake_probe() {
        let registry = PeerRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);

        let info = registry.register(make_addr(8000), ConnectionDirection::Inbound, tx);

        assert!(registry.contains(info.id));
        assert_eq!(rx.try_recv().unwrap(), Message::QueryLatest);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = PeerRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let info = registry.register(make_addr(8000), ConnectionDirection::Outbound, tx);

        assert!(registry.unregister(info.id));
        assert!(!registry.unregister(info.id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_send_to_closed_peer_unregisters() {
        let registry = PeerRegistry::new();
        let (tx, rx) = mpsc::channel(4);
        let info = registry.register(make_addr(8000), ConnectionDirection::Inbound, tx);
        drop(rx);

        let result = registry.send(info.id, Message::QueryAll);

        assert!(matches!(result, Err(P2pError::PeerDisconnected { .. })));
        assert!(!registry.contains(info.id));
    }

    #[test]
    fn test_full_queue_unregisters() {
        let registry = PeerRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        // Handshake probe fills the single slot
        let info = registry.register(make_addr(8000), ConnectionDirection::Inbound, tx);

        assert!(matches!(
            registry.send(info.id, Message::QueryAll),
            Err(P2pError::QueueFull)
        ));
        assert!(!registry.contains(info.id));
    }

    #[test]
    fn test_broadcast_isolates_failures() {
        let registry = PeerRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, rx_b) = mpsc::channel(4);
        let (tx_c, mut rx_c) = mpsc::channel(4);
        registry.register(make_addr(8001), ConnectionDirection::Inbound, tx_a);
        let dead = registry.register(make_addr(8002), ConnectionDirection::Inbound, tx_b);
        registry.register(make_addr(8003), ConnectionDirection::Outbound, tx_c);
        drop(rx_b);

        let message = Message::latest(genesis_block());
        let delivered = registry.broadcast(&message);

        assert_eq!(delivered, 2);
        assert!(!registry.contains(dead.id));
        for rx in [&mut rx_a, &mut rx_c] {
            assert_eq!(rx.try_recv().unwrap(), Message::QueryLatest);
            assert_eq!(rx.try_recv().unwrap(), message);
        }
    }

    #[test]
    fn test_addresses_in_registration_order() {
        let registry = PeerRegistry::new();
        let mut receivers = Vec::new();
        for port in [9003, 9001, 9002] {
            let (tx, rx) = mpsc::channel(4);
            receivers.push(rx);
            registry.register(make_addr(port), ConnectionDirection::Inbound, tx);
        }

        assert_eq!(
            registry.addresses(),
            vec![make_addr(9003), make_addr(9001), make_addr(9002)]
        );
    }
}
