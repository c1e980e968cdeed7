//! Consensus module - Block structure, validation, and chain reconciliation

mod block;
mod validation;
mod reconciliation;

pub use block::*;
pub use validation::*;
pub use reconciliation::*;
