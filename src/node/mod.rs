//! Node module - genesis constant and the node facade
//!
//! `Node` ties the chain manager to the peer registry. It answers peer
//! queries, runs reconciliation on chain responses, and exposes the
//! operations used by the HTTP control surface.

mod genesis;

pub use genesis::*;

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn};

use crate::consensus::{current_timestamp, Block, Reconciliation, ValidationError};
use crate::p2p::{
    self, Message, MessageHandler, P2pConfig, P2pContext, P2pError, PeerId, PeerInfo, PeerRegistry,
};
use crate::storage::ChainManager;

/// Errors surfaced by node operations
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("block rejected: {0}")]
    BlockRejected(#[from] ValidationError),
    #[error("network error: {0}")]
    Network(#[from] P2pError),
}

/// A running ledger node
pub struct Node {
    chain: ChainManager,
    peers: Arc<PeerRegistry>,
    p2p_config: P2pConfig,
}

impl Node {
    /// Create a node holding a genesis-only chain and no peers
    pub fn new(p2p_config: P2pConfig) -> Arc<Self> {
        Arc::new(Self {
            chain: ChainManager::new(),
            peers: Arc::new(PeerRegistry::new()),
            p2p_config,
        })
    }

    /// The chain manager
    pub fn chain(&self) -> &ChainManager {
        &self.chain
    }

    fn context(self: &Arc<Self>) -> P2pContext {
        P2pContext {
            registry: Arc::clone(&self.peers),
            handler: Arc::clone(self) as Arc<dyn MessageHandler>,
            config: self.p2p_config.clone(),
        }
    }

    /// Bind the P2P listener and accept peers in the background.
    ///
    /// Returns the bound address, useful when binding port 0.
    pub async fn listen(
        self: &Arc<Self>,
        addr: SocketAddr,
    ) -> Result<(SocketAddr, JoinHandle<()>), NodeError> {
        let listener = p2p::bind(addr).await?;
        let local_addr = listener.local_addr().map_err(P2pError::Io)?;
        let handle = tokio::spawn(p2p::accept_loop(listener, self.context()));
        Ok((local_addr, handle))
    }

    /// Mine a block carrying `data` on the current tip and broadcast it
    pub fn submit_local_block(&self, data: &str) -> Result<Block, NodeError> {
        let block = self.chain.mine_block(current_timestamp(), data)?;
        info!(index = block.index, hash = %block.hash, "Block added");
        self.broadcast_latest();
        Ok(block)
    }

    /// Copy of the full chain
    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.chain.snapshot()
    }

    /// Remote addresses of all connected peers
    pub fn list_peers(&self) -> Vec<SocketAddr> {
        self.peers.addresses()
    }

    /// Connect to a peer; no retry on failure
    pub async fn add_peer(self: &Arc<Self>, address: &str) -> Result<PeerInfo, NodeError> {
        match p2p::connect(address, &self.context()).await {
            Ok(info) => Ok(info),
            Err(e) => {
                warn!(addr = address, error = %e, "Connection to peer failed");
                Err(e.into())
            }
        }
    }

    /// Connect to each address in turn, logging failures
    pub async fn connect_to_peers(self: &Arc<Self>, addresses: &[String]) -> Vec<PeerInfo> {
        let mut connected = Vec::new();
        for address in addresses {
            if let Ok(info) = self.add_peer(address).await {
                connected.push(info);
            }
        }
        connected
    }

    /// Send the current tip to every peer
    pub fn broadcast_latest(&self) -> usize {
        self.peers.broadcast(&Message::latest(self.chain.latest()))
    }

    /// Reconcile a chain fragment received from `peer` and act on the outcome
    pub fn handle_chain_response(&self, peer: PeerId, blocks: Vec<Block>) -> Reconciliation {
        let span = info_span!("chain_response", peer = %peer);
        let _enter = span.enter();

        let outcome = self.chain.reconcile(blocks);
        if let Reconciliation::QueryAll { .. } = outcome {
            let _ = self.peers.send(peer, Message::QueryAll);
        }
        if outcome.chain_changed() {
            self.broadcast_latest();
        }
        outcome
    }
}

impl MessageHandler for Node {
    fn handle_message(&self, peer: PeerId, message: Message) {
        match message {
            Message::QueryLatest => {
                let _ = self.peers.send(peer, Message::latest(self.chain.latest()));
            }
            Message::QueryAll => {
                let _ = self.peers.send(peer, Message::ResponseChain(self.chain.snapshot()));
            }
            Message::ResponseChain(blocks) => {
                self.handle_chain_response(peer, blocks);
            }
        }
    }
}
