// crates/tally-daemon/src/main.rs
//
// Binary entrypoint for the Tally ledger daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, restores the
// ledger from the last RocksDB checkpoint (or builds it from genesis), then
// produces blocks on a fixed interval until interrupted, checkpointing as it
// goes.

mod config;
mod producer;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::DaemonConfig;
use producer::BlockProducer;
use state::{NodeState, NodeStateMachine};

use tally_api::ChainApi;
use tally_chain::{ChainDatabase, LedgerState};
use tally_store::RocksStore;

/// Tally ledger daemon: applies blocks and distributes rewards.
#[derive(Parser, Debug)]
#[command(name = "tally-daemon", version = "0.1.0", about = "Tally ledger node daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.tally/config.toml")]
    config: String,

    /// Data directory; overrides the config file value.
    #[arg(long)]
    data_dir: Option<String>,

    /// Stop after producing this many blocks.
    #[arg(long)]
    blocks: Option<u64>,

    /// Delay between blocks in milliseconds; overrides the config file value.
    #[arg(long)]
    block_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found.
    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // CLI flags override the config file values.
    if let Some(data_dir) = args.data_dir.clone() {
        daemon_config.data_dir = data_dir;
    }
    if let Some(interval) = args.block_interval_ms {
        daemon_config.block_interval_ms = interval;
    }

    // Initialize tracing subscriber for structured logging. RUST_LOG wins over
    // the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    tracing::info!("Tally Ledger Daemon v0.1.0");
    tracing::info!("Data directory: {}", daemon_config.data_dir);
    tracing::info!("Witnesses: {}", daemon_config.witnesses.join(", "));
    tracing::info!("Checkpoint interval: {} blocks", daemon_config.checkpoint_interval);

    let mut state_machine = NodeStateMachine::new();
    state_machine.transition(NodeState::Loading)?;

    // ---------------------------------------------------------------
    // Restore the ledger: last checkpoint if any, genesis otherwise.
    // ---------------------------------------------------------------
    let data_dir = expand_tilde(&daemon_config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let rocksdb_path = format!("{}/ledger", data_dir);
    let store = RocksStore::open(&rocksdb_path)
        .map_err(|e| format!("Failed to open RocksDB: {}", e))?;

    let chain = match store.load_checkpoint::<LedgerState>()? {
        Some(checkpoint) => {
            tracing::info!("Resuming from checkpoint at block {}", checkpoint.block_num);
            Arc::new(ChainDatabase::from_state(checkpoint.state))
        }
        None => {
            tracing::info!("No checkpoint found, applying genesis");
            let chain = ChainDatabase::open_genesis(&daemon_config.genesis)?;
            store.save_checkpoint(0, &chain.snapshot())?;
            Arc::new(chain)
        }
    };

    let api = ChainApi::new(chain.clone());
    let props = api.get_chain_properties()?;
    tracing::info!(
        "Chain {} at block {} (hardfork {})",
        props.chain_id,
        props.head_block_number,
        props.hf_version
    );

    let producer = BlockProducer::new(
        chain.clone(),
        &daemon_config.witnesses,
        daemon_config.genesis.genesis_time,
    )?;

    state_machine.transition(NodeState::Producing)?;

    // ---------------------------------------------------------------
    // Block production loop.
    // ---------------------------------------------------------------
    let mut produced = 0u64;
    let mut ticker = tokio::time::interval(Duration::from_millis(daemon_config.block_interval_ms.max(1)));
    let result: Result<(), Box<dyn std::error::Error>> = loop {
        if args.blocks.is_some_and(|limit| produced >= limit) {
            tracing::info!("Produced {} blocks, stopping", produced);
            break Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break Ok(());
            }
            _ = ticker.tick() => {
                let report = match producer.produce_block() {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::error!("Block production failed: {}", e);
                        break Err(e.into());
                    }
                };
                produced += 1;

                if daemon_config.checkpoint_interval > 0
                    && report.number % daemon_config.checkpoint_interval == 0
                {
                    store.save_checkpoint(report.number, &chain.snapshot())?;
                    tracing::info!("Checkpoint saved at block {}", report.number);
                }
            }
        }
    };

    // Transition to shutting down and persist the final state.
    let _ = state_machine.transition(NodeState::ShuttingDown);
    let head = chain.head_block_num()?;
    store.save_checkpoint(head, &chain.snapshot())?;

    let capital = api.get_chain_capital()?;
    tracing::info!(
        "Final state at block {}: circulating {}, scorumpower {}, reward pool {}",
        head,
        capital.circulating_capital,
        capital.total_scorumpower,
        capital.reward_pool_balance
    );
    tracing::info!("Tally daemon shut down gracefully");

    result
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
