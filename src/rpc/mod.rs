//! HTTP control surface
//!
//! Lets external tools dump the chain, mine blocks, and manage peers.

mod methods;
mod server;

pub use methods::*;
pub use server::*;
