//! Block structure for the Peer.Vote chain
//!
//! Defines the immutable block. Field names on the wire are camelCase to
//! stay compatible with existing peers.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto::calculate_hash;

/// A single block in the chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain (genesis = 0)
    pub index: u64,
    /// Hash of the preceding block
    pub previous_hash: String,
    /// Creation time in seconds since Unix epoch, informational only
    pub timestamp: f64,
    /// Opaque payload
    pub data: String,
    /// Hash over the four fields above
    pub hash: String,
}

impl Block {
    /// Create a block from all of its fields, hash included
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        timestamp: f64,
        data: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            previous_hash: previous_hash.into(),
            timestamp,
            data: data.into(),
            hash: hash.into(),
        }
    }

    /// Build the successor of `previous` with a freshly computed hash
    pub fn next(previous: &Block, timestamp: f64, data: impl Into<String>) -> Self {
        let index = previous.index + 1;
        let data = data.into();
        let hash = calculate_hash(index, &previous.hash, timestamp, &data);
        Self {
            index,
            previous_hash: previous.hash.clone(),
            timestamp,
            data,
            hash,
        }
    }

    /// Recompute the hash from the block contents
    pub fn compute_hash(&self) -> String {
        calculate_hash(self.index, &self.previous_hash, self.timestamp, &self.data)
    }

    /// Check that the stored hash matches the contents
    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }
}

/// Current wall-clock time in fractional seconds
pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64 / 1000.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::genesis_block;

    #[test]
    fn test_next_block_links_to_previous() {
        let genesis = genesis_block();
        let block = Block::next(&genesis, 1465154706.0, "hello");

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis.hash);
        assert!(block.has_valid_hash());
    }

    #[test]
    fn test_tampered_data_breaks_hash() {
        let mut block = Block::next(&genesis_block(), 1465154706.0, "hello");
        block.data = "goodbye".to_string();
        assert!(!block.has_valid_hash());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let block = Block::new(1, "abc", 2.0, "d", "h");
        let json = serde_json::to_value(&block).unwrap();

        assert_eq!(json["previousHash"], "abc");
        assert!(json.get("previous_hash").is_none());
    }

    #[test]
    fn test_parse_integral_timestamp() {
        let json = r#"{"index":0,"previousHash":"0","timestamp":1465154705,"data":"x","hash":"h"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.timestamp, 1465154705.0);
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        assert!(current_timestamp() > 1_600_000_000.0);
    }
}
