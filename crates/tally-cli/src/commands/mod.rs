// crates/tally-cli/src/commands/mod.rs
//
// Command implementations for the Tally CLI.

pub mod capital;
pub mod fund;
pub mod hardfork;
pub mod properties;

use std::sync::Arc;

use tally_api::ChainApi;
use tally_chain::{ChainDatabase, LedgerState};
use tally_core::{Result, TallyError};
use tally_store::RocksStore;

/// Open the checkpoint under `data_dir` read-only and wrap it in a chain API.
///
/// The daemon may hold the database open for writing; the read-only handle
/// sees the last checkpoint it flushed.
pub fn open_api(data_dir: &str) -> Result<ChainApi> {
    let path = format!("{}/ledger", data_dir);
    let store = RocksStore::open_read_only(&path)?;
    let checkpoint = store
        .load_checkpoint::<LedgerState>()?
        .ok_or_else(|| TallyError::ObjectNotFound(format!("checkpoint in {}", path)))?;
    Ok(ChainApi::new(Arc::new(ChainDatabase::from_state(checkpoint.state))))
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
