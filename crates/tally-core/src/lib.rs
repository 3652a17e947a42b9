// crates/tally-core/src/lib.rs
//
// tally-core: Asset arithmetic, protocol constants, shared chain types, and
// the protocol-wide error enum for the Tally ledger.
//
// This is the leaf crate that all other crates in the workspace depend on.

pub mod asset;
pub mod error;
pub mod protocol;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
pub use asset::{Asset, Symbol};
pub use error::{Result, TallyError};
pub use types::{AccountName, BlockId, ChainId, ChainProperties, Version};
