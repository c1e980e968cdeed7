//! Chain manager
//!
//! Sole owner of the chain. Every read-decide-write step runs under one
//! mutex so two reconciliations can never both succeed against the same tip.
//! The lock is never held across an await point.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::consensus::{reconcile, Block, Reconciliation, ValidationError};
use crate::storage::ChainState;

/// Serialized access to the node's chain state
#[derive(Debug, Default)]
pub struct ChainManager {
    state: Mutex<ChainState>,
}

impl ChainManager {
    /// Create a manager holding a genesis-only chain
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        // A panic mid-update cannot leave the Vec half-written, so keep going
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last block of the chain
    pub fn latest(&self) -> Block {
        self.lock().latest().clone()
    }

    /// Copy of the full chain
    pub fn snapshot(&self) -> Vec<Block> {
        self.lock().blocks().to_vec()
    }

    /// Current chain length
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Always false: the chain holds at least the genesis block
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append `block` if it is a valid successor of the current tip
    pub fn try_append(&self, block: Block) -> bool {
        let outcome = {
            let mut state = self.lock();
            match state.append_block(block) {
                Ok(()) => Reconciliation::Appended(state.latest().clone()),
                Err(e) => Reconciliation::AppendRejected(e),
            }
        };
        log_outcome(&outcome);
        outcome.chain_changed()
    }

    /// Replace the chain if `candidate` is valid and strictly longer
    pub fn try_replace(&self, candidate: Vec<Block>) -> bool {
        let length = candidate.len();
        let outcome = match self.lock().replace_chain(candidate) {
            Ok(()) => Reconciliation::Replaced { length },
            Err(e) => Reconciliation::ReplaceRejected(e),
        };
        log_outcome(&outcome);
        outcome.chain_changed()
    }

    /// Build a block on the current tip and append it under the same lock
    pub fn mine_block(&self, timestamp: f64, data: &str) -> Result<Block, ValidationError> {
        self.lock().mine_block(timestamp, data)
    }

    /// Run the reconciliation decision atomically against the current chain
    pub fn reconcile(&self, received: Vec<Block>) -> Reconciliation {
        let outcome = reconcile(&mut self.lock(), received);
        log_outcome(&outcome);
        outcome
    }
}

fn log_outcome(outcome: &Reconciliation) {
    match outcome {
        Reconciliation::Empty => {
            debug!("Empty chain response");
        }
        Reconciliation::NotAhead { held, received } => {
            debug!(held, received, "Received chain is not longer, nothing to do");
        }
        Reconciliation::Appended(block) => {
            info!(index = block.index, hash = %block.hash, "Block appended");
        }
        Reconciliation::AppendRejected(reason) => {
            warn!(reason = %reason, "Block rejected");
        }
        Reconciliation::QueryAll { held, received } => {
            info!(held, received, "Chain possibly behind, querying full chain");
        }
        Reconciliation::Replaced { length } => {
            info!(length, "Received chain is valid, replaced local chain");
        }
        Reconciliation::ReplaceRejected(reason @ ValidationError::ChainNotLonger { .. }) => {
            info!(reason = %reason, "Received chain not adopted");
        }
        Reconciliation::ReplaceRejected(reason) => {
            warn!(reason = %reason, "Received chain invalid");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::genesis_block;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_latest_is_genesis_initially() {
        let manager = ChainManager::new();
        assert_eq!(manager.latest(), genesis_block());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_try_append() {
        let manager = ChainManager::new();
        let block = Block::next(&manager.latest(), 2.0, "a");

        assert!(manager.try_append(block.clone()));
        assert!(!manager.try_append(block));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_try_replace_requires_longer() {
        let manager = ChainManager::new();
        manager.mine_block(2.0, "local").unwrap();

        let mut other = ChainState::new();
        other.mine_block(3.0, "remote").unwrap();
        assert!(!manager.try_replace(other.blocks().to_vec()));

        other.mine_block(4.0, "remote 2").unwrap();
        assert!(manager.try_replace(other.blocks().to_vec()));
        assert_eq!(manager.snapshot(), other.blocks());
    }

    #[test]
    fn test_reconcile_agrees_with_try_operations() {
        let by_reconcile = ChainManager::new();
        let by_append = ChainManager::new();
        let block = Block::next(&genesis_block(), 2.0, "a");

        assert_eq!(
            by_reconcile.reconcile(vec![block.clone()]),
            Reconciliation::Appended(block.clone())
        );
        assert!(by_append.try_append(block));
        assert_eq!(by_reconcile.snapshot(), by_append.snapshot());

        let mut remote = ChainState::new();
        remote.mine_block(3.0, "b").unwrap();
        remote.mine_block(4.0, "c").unwrap();
        let chain = remote.blocks().to_vec();

        assert_eq!(
            by_reconcile.reconcile(chain.clone()),
            Reconciliation::Replaced { length: 3 }
        );
        assert!(by_append.try_replace(chain));
        assert_eq!(by_reconcile.snapshot(), by_append.snapshot());
    }

    #[test]
    fn test_concurrent_mining_keeps_chain_valid() {
        let manager = Arc::new(ChainManager::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    for i in 0..25 {
                        manager.mine_block(i as f64, &format!("{}-{}", t, i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let chain = manager.snapshot();
        assert_eq!(chain.len(), 201);
        assert!(crate::consensus::is_valid_chain(&chain));
    }
}
