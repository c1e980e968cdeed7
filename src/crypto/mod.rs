//! Cryptography module - SHA-256 hashing of blocks

mod hash;

pub use hash::*;
