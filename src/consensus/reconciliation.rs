//! Chain reconciliation
//!
//! Decides what to do with a chain fragment reported by a peer: ignore it,
//! append its tip directly, ask the peer for its full chain, or swap in the
//! whole received chain. The decision and any resulting write happen against
//! the same `&mut ChainState`, so the caller's lock covers read and write.

use crate::consensus::{Block, ValidationError};
use crate::storage::ChainState;

/// Outcome of reconciling a received fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Peer sent no blocks
    Empty,
    /// Local chain is at least as long as the peer's
    NotAhead { held: u64, received: u64 },
    /// Peer tip linked onto the local tip and was appended
    Appended(Block),
    /// Peer tip linked onto the local tip but failed validation
    AppendRejected(ValidationError),
    /// Peer is ahead by more than one block and sent only its tip
    QueryAll { held: u64, received: u64 },
    /// Received chain replaced the local one
    Replaced { length: usize },
    /// Received chain was refused
    ReplaceRejected(ValidationError),
}

impl Reconciliation {
    /// Whether the local chain changed and the new tip should be broadcast
    pub fn chain_changed(&self) -> bool {
        matches!(self, Reconciliation::Appended(_) | Reconciliation::Replaced { .. })
    }
}

/// Reconcile `received` against `state`, mutating it when warranted.
///
/// Blocks are sorted by index first; peers are not required to send them in
/// order.
pub fn reconcile(state: &mut ChainState, mut received: Vec<Block>) -> Reconciliation {
    received.sort_by_key(|block| block.index);

    let latest_received = match received.last() {
        Some(block) => block.clone(),
        None => return Reconciliation::Empty,
    };
    let latest_held = state.latest();

    if latest_received.index <= latest_held.index {
        return Reconciliation::NotAhead {
            held: latest_held.index,
            received: latest_received.index,
        };
    }

    if latest_held.hash == latest_received.previous_hash {
        return match state.append_block(latest_received.clone()) {
            Ok(()) => Reconciliation::Appended(latest_received),
            Err(e) => Reconciliation::AppendRejected(e),
        };
    }

    if received.len() == 1 {
        return Reconciliation::QueryAll {
            held: latest_held.index,
            received: latest_received.index,
        };
    }

    let length = received.len();
    match state.replace_chain(received) {
        Ok(()) => Reconciliation::Replaced { length },
        Err(e) => Reconciliation::ReplaceRejected(e),
    }
}
