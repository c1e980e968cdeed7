//! Genesis block for the Peer.Vote chain
//!
//! The genesis block is a network-wide constant. It is never mined and
//! must be byte-identical on every node; any chain starting elsewhere is
//! rejected.

use crate::consensus::Block;
use crate::constants::{
    GENESIS_DATA, GENESIS_HASH, GENESIS_INDEX, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP,
};

/// Create the genesis block
pub fn genesis_block() -> Block {
    Block::new(
        GENESIS_INDEX,
        GENESIS_PREVIOUS_HASH,
        GENESIS_TIMESTAMP,
        GENESIS_DATA,
        GENESIS_HASH,
    )
}

/// Check whether `block` is the genesis block, field for field
pub fn is_genesis(block: &Block) -> bool {
    *block == genesis_block()
}
