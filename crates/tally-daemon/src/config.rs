// crates/tally-daemon/src/config.rs
//
// Runtime configuration for the Tally ledger daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use tally_chain::GenesisConfig;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for local data storage (RocksDB checkpoints).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Wall-clock delay between produced blocks, in milliseconds.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,

    /// Persist a checkpoint every this many blocks.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,

    /// Producers, scheduled round-robin by slot. Each must be a genesis
    /// account.
    #[serde(default = "default_witnesses")]
    pub witnesses: Vec<String>,

    /// Genesis parameters, used only when no checkpoint exists yet.
    #[serde(default)]
    pub genesis: GenesisConfig,
}

fn default_data_dir() -> String {
    "~/.tally/data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_block_interval_ms() -> u64 {
    3_000
}

fn default_checkpoint_interval() -> u64 {
    100
}

fn default_witnesses() -> Vec<String> {
    vec!["initdelegate".to_string()]
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            block_interval_ms: default_block_interval_ms(),
            checkpoint_interval: default_checkpoint_interval(),
            witnesses: default_witnesses(),
            genesis: GenesisConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
