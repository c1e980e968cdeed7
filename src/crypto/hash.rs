//! SHA-256 hashing implementation
//!
//! Block hashes are SHA-256 over the textual concatenation of the block
//! fields, rendered as lowercase hex. The canonical form must match every
//! other node on the network bit-for-bit.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes using SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash arbitrary bytes and return lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Render a timestamp the way it is fed into the block hash.
///
/// Follows ECMAScript `Number#toString`: the shortest round-tripping digits,
/// no fractional part for integral values (`1465154705`), exponent form
/// outside `[1e-6, 1e21)` (`1e+21`, `1.5e-7`), and `-0` printed as `0`.
pub fn format_timestamp(timestamp: f64) -> String {
    let mut buffer = ryu_js::Buffer::new();
    buffer.format(timestamp).to_string()
}

/// Canonical preimage: `index · previousHash · timestamp · data`
pub fn hash_preimage(index: u64, previous_hash: &str, timestamp: f64, data: &str) -> String {
    let timestamp = format_timestamp(timestamp);
    let mut preimage =
        String::with_capacity(20 + previous_hash.len() + timestamp.len() + data.len());
    preimage.push_str(&index.to_string());
    preimage.push_str(previous_hash);
    preimage.push_str(&timestamp);
    preimage.push_str(data);
    preimage
}

/// Compute the hash of a block from its four content fields
pub fn calculate_hash(index: u64, previous_hash: &str, timestamp: f64, data: &str) -> String {
    sha256_hex(hash_preimage(index, previous_hash, timestamp, data).as_bytes())
}
