// crates/tally-store/src/rocks.rs
//
// RocksDB-backed checkpoints of committed ledger state.
//
// Key format:
//   - `checkpoint:head`        -> JSON-serialized `Checkpoint<S>`
//   - `checkpoint:head_block`  -> big-endian u64 block number of the head checkpoint
//
// Both keys are written in one atomic batch so a reader never sees a block
// number that disagrees with the stored state.

use rocksdb::{DBWithThreadMode, MultiThreaded, Options, WriteBatch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tally_core::error::TallyError;

const HEAD_KEY: &[u8] = b"checkpoint:head";
const HEAD_BLOCK_KEY: &[u8] = b"checkpoint:head_block";

/// A persisted snapshot of committed state at a given block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    /// Head block number when the snapshot was taken.
    pub block_num: u64,
    /// The committed state.
    pub state: S,
}

/// RocksDB wrapper storing ledger checkpoints.
#[derive(Debug)]
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, TallyError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path)
            .map_err(|e| TallyError::Storage(format!("Failed to open RocksDB at {}: {}", path, e)))?;

        Ok(Self { db })
    }

    /// Open an existing database without taking the write lock, so a running
    /// daemon can be inspected.
    pub fn open_read_only(path: &str) -> Result<Self, TallyError> {
        let opts = Options::default();
        let db = DBWithThreadMode::<MultiThreaded>::open_for_read_only(&opts, path, false)
            .map_err(|e| {
                TallyError::Storage(format!("Failed to open RocksDB read-only at {}: {}", path, e))
            })?;

        Ok(Self { db })
    }

    /// Get raw bytes from RocksDB, mapping errors to TallyError::Storage.
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TallyError> {
        self.db
            .get(key)
            .map_err(|e| TallyError::Storage(format!("RocksDB get failed: {}", e)))
    }

    /// Persist `state` as the head checkpoint at `block_num`.
    pub fn save_checkpoint<S: Serialize>(&self, block_num: u64, state: &S) -> Result<(), TallyError> {
        let json = serde_json::to_vec(&Checkpoint { block_num, state })?;

        let mut batch = WriteBatch::default();
        batch.put(HEAD_KEY, &json);
        batch.put(HEAD_BLOCK_KEY, block_num.to_be_bytes());

        self.db
            .write(batch)
            .map_err(|e| TallyError::Storage(format!("RocksDB write failed: {}", e)))?;

        tracing::debug!("Checkpoint written at block {} ({} bytes)", block_num, json.len());
        Ok(())
    }

    /// Load the head checkpoint, if one has been written.
    pub fn load_checkpoint<S: DeserializeOwned>(&self) -> Result<Option<Checkpoint<S>>, TallyError> {
        match self.get_raw(HEAD_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Block number of the head checkpoint without deserializing the state.
    pub fn head_block(&self) -> Result<Option<u64>, TallyError> {
        match self.get_raw(HEAD_BLOCK_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    TallyError::Storage(format!("Corrupt head block marker ({} bytes)", bytes.len()))
                })?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn temp_db_path(label: &str) -> String {
        let path = std::env::temp_dir().join(format!("tally_test_{}_{}", label, Uuid::now_v7()));
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_empty_store_has_no_checkpoint() {
        let path = temp_db_path("empty");
        let store = RocksStore::open(&path).unwrap();
        let loaded: Option<Checkpoint<u64>> = store.load_checkpoint().unwrap();
        assert!(loaded.is_none());
        assert_eq!(store.head_block().unwrap(), None);
        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn test_checkpoint_overwrites_head() {
        let path = temp_db_path("head");
        let store = RocksStore::open(&path).unwrap();

        let mut state = BTreeMap::new();
        state.insert("alice".to_string(), 10i64);
        store.save_checkpoint(5, &state).unwrap();

        state.insert("bob".to_string(), 3i64);
        store.save_checkpoint(6, &state).unwrap();

        let loaded: Checkpoint<BTreeMap<String, i64>> = store.load_checkpoint().unwrap().unwrap();
        assert_eq!(loaded.block_num, 6);
        assert_eq!(loaded.state, state);
        assert_eq!(store.head_block().unwrap(), Some(6));
        let _ = std::fs::remove_dir_all(&path);
    }
}
