use thiserror::Error;

use crate::asset::{Asset, Symbol};

/// Protocol-wide error types for the Tally ledger.
///
/// Every variant is fatal to the block application that produced it: the
/// caller rolls the ledger back to the pre-block snapshot and rejects the block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    /// Arithmetic or comparison between assets of different symbols.
    #[error("Symbol mismatch: {left} vs {right}")]
    SymbolMismatch { left: Symbol, right: Symbol },

    /// An asset was supplied in a symbol the target object does not hold.
    #[error("Invalid symbol: expected {expected}, got {actual}")]
    InvalidSymbol { expected: Symbol, actual: Symbol },

    /// A balance increase was requested with a negative amount.
    #[error("Negative delta: {0}")]
    NegativeDelta(Asset),

    /// A persisted balance would become negative.
    #[error("Negative balance: {0}")]
    NegativeBalance(String),

    /// The requested ledger object does not exist.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// A singleton or keyed object was created twice.
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    /// A reward fund kind outside the closed set was requested.
    #[error("Unknown fund: {0}")]
    UnknownFund(String),

    /// Integer overflow in asset arithmetic.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Invalid state transition or malformed input.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage layer error (RocksDB).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TallyError {
    fn from(e: serde_json::Error) -> Self {
        TallyError::Serialization(e.to_string())
    }
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, TallyError>;
