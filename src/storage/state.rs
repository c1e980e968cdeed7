//! Chain state management
//!
//! Holds the node's current view of the chain in memory. The chain starts
//! at genesis, grows one block at a time or is swapped wholesale for a
//! longer valid chain, and never shrinks.

use crate::consensus::{validate_chain, validate_new_block, Block, ValidationError};
use crate::node::genesis_block;

/// Complete chain state
#[derive(Debug, Clone)]
pub struct ChainState {
    /// Blocks ordered by index, never empty
    blocks: Vec<Block>,
}

impl ChainState {
    /// Create a new chain state holding only the genesis block
    pub fn new() -> Self {
        Self {
            blocks: vec![genesis_block()],
        }
    }

    /// Last block of the chain
    pub fn latest(&self) -> &Block {
        // The chain always holds at least the genesis block
        &self.blocks[self.blocks.len() - 1]
    }

    /// All blocks, genesis first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a chain holds at least the genesis block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append a block on top of the current tip if it is a valid successor
    pub fn append_block(&mut self, block: Block) -> Result<(), ValidationError> {
        validate_new_block(&block, self.latest())?;
        self.blocks.push(block);
        Ok(())
    }

    /// Replace the chain with `candidate` if it is valid and strictly longer.
    ///
    /// Equal-length candidates keep the incumbent.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<(), ValidationError> {
        validate_chain(&candidate)?;
        if candidate.len() <= self.blocks.len() {
            return Err(ValidationError::ChainNotLonger {
                candidate: candidate.len(),
                current: self.blocks.len(),
            });
        }
        self.blocks = candidate;
        Ok(())
    }

    /// Build and append a block carrying `data` on top of the current tip
    pub fn mine_block(&mut self, timestamp: f64, data: &str) -> Result<Block, ValidationError> {
        let block = Block::next(self.latest(), timestamp, data);
        self.append_block(block.clone())?;
        Ok(block)
    }
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new()
    }
}
