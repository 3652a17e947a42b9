// crates/tally-api/src/lib.rs
//
// tally-api: Read-only chain API for the Tally ledger.
//
// Every call takes one shared read lock on the ledger and returns a plain
// serde object, so answers are always consistent snapshots of a single
// committed state.

pub mod chain_api;
pub mod objects;

pub use chain_api::ChainApi;
pub use objects::{
    ChainCapitalApiObj, ChainPropertiesApiObj, RewardFundApiObj, RewardFundType,
    ScheduledHardforkApiObj,
};
