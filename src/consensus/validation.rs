//! Block and chain validation
//!
//! Pure functions for validating blocks and chains. Every check returns a
//! typed reason so callers can log why a block or chain was refused.

use crate::consensus::Block;
use crate::node::is_genesis;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("invalid index: expected {expected}, got {actual}")]
    InvalidIndex { expected: u64, actual: u64 },
    #[error("invalid previous hash: expected {expected}, got {actual}")]
    InvalidPreviousHash { expected: String, actual: String },
    #[error("invalid hash: computed {computed}, block claims {claimed}")]
    InvalidHash { computed: String, claimed: String },
    #[error("chain is empty")]
    EmptyChain,
    #[error("first block does not match the genesis block")]
    GenesisMismatch,
    #[error("chain of length {candidate} is not longer than current length {current}")]
    ChainNotLonger { candidate: usize, current: usize },
}

/// Validate `candidate` as the direct successor of `previous`.
///
/// Checks run in order index, previous hash, hash; the first failure wins.
pub fn validate_new_block(candidate: &Block, previous: &Block) -> Result<(), ValidationError> {
    let expected = previous.index + 1;
    if candidate.index != expected {
        return Err(ValidationError::InvalidIndex {
            expected,
            actual: candidate.index,
        });
    }

    if candidate.previous_hash != previous.hash {
        return Err(ValidationError::InvalidPreviousHash {
            expected: previous.hash.clone(),
            actual: candidate.previous_hash.clone(),
        });
    }

    let computed = candidate.compute_hash();
    if computed != candidate.hash {
        return Err(ValidationError::InvalidHash {
            computed,
            claimed: candidate.hash.clone(),
        });
    }

    Ok(())
}

/// Boolean form of [`validate_new_block`]
pub fn is_valid_new_block(candidate: &Block, previous: &Block) -> bool {
    validate_new_block(candidate, previous).is_ok()
}

/// Validate a whole chain from genesis.
///
/// The first block must equal the genesis constant field for field; every
/// later block must be a valid successor of the one before it.
pub fn validate_chain(chain: &[Block]) -> Result<(), ValidationError> {
    let first = chain.first().ok_or(ValidationError::EmptyChain)?;
    if !is_genesis(first) {
        return Err(ValidationError::GenesisMismatch);
    }

    for pair in chain.windows(2) {
        validate_new_block(&pair[1], &pair[0])?;
    }

    Ok(())
}

/// Boolean form of [`validate_chain`]
pub fn is_valid_chain(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::genesis_block;

    fn build_chain(len: usize) -> Vec<Block> {
        let mut chain = vec![genesis_block()];
        for i in 1..len {
            let prev = chain.last().unwrap();
            let block = Block::next(prev, 1465154705.0 + i as f64, format!("block {}", i));
            chain.push(block);
        }
        chain
    }

    #[test]
    fn test_valid_successor() {
        let chain = build_chain(2);
        assert!(is_valid_new_block(&chain[1], &chain[0]));
    }

    #[test]
    fn test_invalid_index() {
        let chain = build_chain(2);
        let mut block = chain[1].clone();
        block.index = 5;

        assert_eq!(
            validate_new_block(&block, &chain[0]),
            Err(ValidationError::InvalidIndex { expected: 1, actual: 5 })
        );
    }

    #[test]
    fn test_invalid_previous_hash() {
        let chain = build_chain(2);
        let mut block = chain[1].clone();
        block.previous_hash = "deadbeef".to_string();

        assert!(matches!(
            validate_new_block(&block, &chain[0]),
            Err(ValidationError::InvalidPreviousHash { .. })
        ));
    }

    #[test]
    fn test_invalid_hash() {
        let chain = build_chain(2);
        let mut block = chain[1].clone();
        block.timestamp += 1.0;

        assert!(matches!(
            validate_new_block(&block, &chain[0]),
            Err(ValidationError::InvalidHash { .. })
        ));
    }

    #[test]
    fn test_index_checked_before_hash() {
        let chain = build_chain(2);
        let mut block = chain[1].clone();
        block.index = 9;
        block.previous_hash = "x".to_string();

        assert!(matches!(
            validate_new_block(&block, &chain[0]),
            Err(ValidationError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        assert!(is_valid_chain(&[genesis_block()]));
    }

    #[test]
    fn test_empty_chain_invalid() {
        assert_eq!(validate_chain(&[]), Err(ValidationError::EmptyChain));
    }

    #[test]
    fn test_wrong_genesis_rejected() {
        // Internally consistent chain rooted at a different genesis
        let fake_genesis = Block::new(0, "0", 1.0, "other", "abc");
        let next = Block::next(&fake_genesis, 2.0, "x");

        assert_eq!(
            validate_chain(&[fake_genesis, next]),
            Err(ValidationError::GenesisMismatch)
        );
    }

    #[test]
    fn test_tampered_middle_block_rejected() {
        let mut chain = build_chain(4);
        chain[2].data = "tampered".to_string();

        assert!(matches!(
            validate_chain(&chain),
            Err(ValidationError::InvalidHash { .. })
        ));
    }

    #[test]
    fn test_long_chain_valid() {
        assert!(is_valid_chain(&build_chain(10)));
    }
}
