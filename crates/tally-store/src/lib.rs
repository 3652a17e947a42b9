// crates/tally-store/src/lib.rs
//
// tally-store: Storage layer for the Tally ledger.
//
// Provides the lock-guarded in-memory object state with nested undo sessions
// used for block-level rollback, and RocksDB checkpoints of committed state.

pub mod database;
pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use database::{ObjectDatabase, UndoSession};
pub use rocks::{Checkpoint, RocksStore};
