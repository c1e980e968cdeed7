//! P2P networking module - Peer registry, wire protocol, framing and transport

mod codec;
mod error;
mod peer;
mod protocol;
mod server;

pub use codec::*;
pub use error::*;
pub use peer::*;
pub use protocol::*;
pub use server::*;
