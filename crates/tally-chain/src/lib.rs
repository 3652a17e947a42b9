// crates/tally-chain/src/lib.rs
//
// tally-chain: Consensus-state engine of the Tally ledger.
//
// Object services over a lock-guarded ledger, the self-adjusting reward
// balancer, budgets, reward funds, and per-block reward distribution with
// all-or-nothing block application.

pub mod account;
pub mod budget;
pub mod database;
pub mod dev_pool;
pub mod distribution;
pub mod dynamic_global_property;
pub mod genesis;
pub mod hardfork_property;
pub mod objects;
pub mod registration_pool;
pub mod reward_balancer;
pub mod reward_fund;
pub mod service;

// Re-export the block application surface.
pub use database::{BlockContext, BlockReport, ChainDatabase, Services};
pub use distribution::{split_reward, RewardSource, RewardSplit, VirtualOperation};
pub use genesis::{GenesisAccount, GenesisConfig};
pub use objects::LedgerState;
pub use service::{LedgerDatabase, ServiceBase, Singleton};
