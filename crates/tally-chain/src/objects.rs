// crates/tally-chain/src/objects.rs
//
// Persisted ledger objects.
//
// Singletons (pools, funds, global properties) live in `Option` slots of
// `LedgerState`; keyed objects (accounts, advertising budgets, registration
// bonuses) live in ordered maps so iteration order is identical on every node.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::protocol::{min_per_block_reward, ONE_HUNDRED_PERCENT};
use tally_core::{AccountName, Asset, BlockId, ChainId, ChainProperties, Symbol, Version};

/// A self-regulating reservoir that emits an adaptively-sized amount per block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBalancerObject {
    /// Remaining balance of the pool.
    pub balance: Asset,
    /// Amount the balancer intends to emit in the next block, before clamping
    /// to the available balance.
    pub current_per_block_reward: Asset,
}

impl RewardBalancerObject {
    /// A fresh balancer holding `balance`, seeded at the minimum per-block reward.
    pub fn new(balance: Asset) -> Self {
        Self {
            balance,
            current_per_block_reward: min_per_block_reward(balance.symbol),
        }
    }
}

/// Content reward fund: accumulates the content share of each block's emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRewardFundObject {
    pub activity_reward_balance: Asset,
    pub last_update: DateTime<Utc>,
}

/// Development pool, fed by the dev-team skim of advertising emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevPoolObject {
    pub scr_balance: Asset,
    pub sp_balance: Asset,
}

/// One stage of the registration bonus schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStage {
    /// Number of registrations covered by this stage.
    pub users: u64,
    /// Share of the maximum bonus paid during this stage, in basis points.
    pub bonus_percent: i64,
}

/// Pool paying registration bonuses to newly created accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPoolObject {
    pub balance: Asset,
    pub maximum_bonus: Asset,
    pub schedule: Vec<RegistrationStage>,
    pub already_allocated_count: u64,
}

impl RegistrationPoolObject {
    /// Bonus percent of the stage the next registration falls into.
    ///
    /// Registrations past the end of the schedule use the last stage.
    pub fn current_bonus_percent(&self) -> i64 {
        let mut covered = 0u64;
        for stage in &self.schedule {
            covered = covered.saturating_add(stage.users);
            if self.already_allocated_count < covered {
                return stage.bonus_percent;
            }
        }
        self.schedule
            .last()
            .map(|stage| stage.bonus_percent)
            .unwrap_or(ONE_HUNDRED_PERCENT)
    }
}

/// A budget emitting a fixed amount per block until its deadline.
///
/// The fund budget (SP) is a singleton; advertising budgets (SCR) are keyed by
/// `id` and owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetObject {
    pub id: u64,
    pub owner: Option<AccountName>,
    pub balance: Asset,
    pub per_block: Asset,
    /// Block number at which the budget was created.
    pub created: u64,
    /// Block number at which the remaining balance is released in full.
    pub deadline: u64,
}

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountObject {
    pub name: AccountName,
    /// Liquid balance (SCR).
    pub balance: Asset,
    /// Staked balance (SP).
    pub scorumpower: Asset,
    pub created: DateTime<Utc>,
}

impl AccountObject {
    pub fn new(name: AccountName, created: DateTime<Utc>) -> Self {
        Self {
            name,
            balance: Asset::zero(Symbol::Scr),
            scorumpower: Asset::zero(Symbol::Sp),
            created,
        }
    }
}

/// Record of a registration bonus attached to a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationBonusObject {
    pub account: AccountName,
    pub bonus: Asset,
    /// Block number at which the record is released.
    pub expires: u64,
}

/// The chain-wide snapshot mutated once per block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGlobalPropertyObject {
    pub head_block_id: BlockId,
    pub head_block_number: u64,
    pub last_irreversible_block_num: u64,
    pub current_aslot: u64,
    pub time: DateTime<Utc>,
    pub current_witness: AccountName,
    pub total_supply: Asset,
    /// Supply held by accounts, liquid and staked, counted in SCR.
    pub circulating_capital: Asset,
    pub total_scorumpower: Asset,
    pub median_chain_props: ChainProperties,
    pub majority_version: Version,
}

/// Current and scheduled hardfork versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardforkPropertyObject {
    pub current_hardfork_version: Version,
    pub next_hardfork: Version,
    pub next_hardfork_time: DateTime<Utc>,
}

/// Every persisted ledger object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub chain_id: ChainId,
    pub dynamic_global_property: Option<DynamicGlobalPropertyObject>,
    pub hardfork_property: Option<HardforkPropertyObject>,
    pub content_reward_balancer_scr: Option<RewardBalancerObject>,
    pub content_reward_balancer_sp: Option<RewardBalancerObject>,
    pub content_reward_fund_scr: Option<ContentRewardFundObject>,
    pub content_reward_fund_sp: Option<ContentRewardFundObject>,
    #[serde(default)]
    pub fifa_world_cup_2018_bounty_reward_fund: Option<ContentRewardFundObject>,
    pub dev_pool: Option<DevPoolObject>,
    pub registration_pool: Option<RegistrationPoolObject>,
    pub fund_budget: Option<BudgetObject>,
    pub advertising_budgets: BTreeMap<u64, BudgetObject>,
    pub next_budget_id: u64,
    pub accounts: BTreeMap<AccountName, AccountObject>,
    pub registration_bonuses: BTreeMap<AccountName, RegistrationBonusObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(schedule: Vec<RegistrationStage>, allocated: u64) -> RegistrationPoolObject {
        RegistrationPoolObject {
            balance: Asset::scr(1_000),
            maximum_bonus: Asset::scr(100),
            schedule,
            already_allocated_count: allocated,
        }
    }

    #[test]
    fn test_balancer_seeded_at_minimum() {
        let balancer = RewardBalancerObject::new(Asset::sp(500));
        assert_eq!(balancer.current_per_block_reward, Asset::sp(1));
    }

    #[test]
    fn test_registration_stage_lookup() {
        let schedule = vec![
            RegistrationStage { users: 2, bonus_percent: 10_000 },
            RegistrationStage { users: 3, bonus_percent: 5_000 },
        ];
        assert_eq!(pool(schedule.clone(), 0).current_bonus_percent(), 10_000);
        assert_eq!(pool(schedule.clone(), 1).current_bonus_percent(), 10_000);
        assert_eq!(pool(schedule.clone(), 2).current_bonus_percent(), 5_000);
        assert_eq!(pool(schedule.clone(), 4).current_bonus_percent(), 5_000);
        // Past the end of the schedule the last stage keeps applying.
        assert_eq!(pool(schedule, 50).current_bonus_percent(), 5_000);
    }
}
