//! Storage module - in-memory chain state and its single owner

mod state;
mod manager;

pub use state::*;
pub use manager::*;
