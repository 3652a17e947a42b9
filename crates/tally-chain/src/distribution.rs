// crates/tally-chain/src/distribution.rs
//
// Per-block reward distribution.
//
// Every active source (fund budget, advertising budgets, content reward
// balancers) releases one block of emission, which is split as follows:
//   1. Advertising budgets only: DEV_TEAM_PER_BLOCK_REWARD_PERCENT (10%) is
//      skimmed into the dev pool.
//   2. WITNESS_PER_BLOCK_REWARD_PERCENT (10%) of what remains is credited to
//      the producing witness (SCR to its balance, SP to its scorumpower).
//   3. The rest goes to the content reward fund of the emission's symbol.
//
// Each percentage is taken off the amount left after the previous skim, so the
// three shares always sum exactly to the emission.
//
// Every routing step is fallible. `distribute` does not roll back on its own:
// it runs inside the caller's undo session, and the first error aborts the
// whole block.

use serde::{Deserialize, Serialize};

use tally_core::error::Result;
use tally_core::protocol::{
    DEV_TEAM_PER_BLOCK_REWARD_PERCENT, ONE_HUNDRED_PERCENT, WITNESS_PER_BLOCK_REWARD_PERCENT,
};
use tally_core::{AccountName, Asset, Symbol};

use crate::database::{BlockContext, Services};

/// A pool that emits currency once per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardSource {
    /// The genesis SP fund budget.
    FundBudget,
    /// An advertising budget, by id.
    AdvertisingBudget(u64),
    ContentRewardBalancerScr,
    ContentRewardBalancerSp,
}

impl RewardSource {
    /// Whether the dev-team share is skimmed from this source's emission.
    pub fn pays_dev_team(&self) -> bool {
        matches!(self, RewardSource::AdvertisingBudget(_))
    }
}

/// One emission split into its destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    pub dev_team: Asset,
    pub witness: Asset,
    pub content: Asset,
}

/// Split `emission` into dev-team, witness, and content shares.
///
/// The dev-team share is zero unless `skim_dev_team` is set.
pub fn split_reward(emission: Asset, skim_dev_team: bool) -> Result<RewardSplit> {
    let dev_team = if skim_dev_team {
        emission.mul_div(DEV_TEAM_PER_BLOCK_REWARD_PERCENT, ONE_HUNDRED_PERCENT)?
    } else {
        Asset::zero(emission.symbol)
    };
    let users = emission.checked_sub(dev_team)?;

    let witness = users.mul_div(WITNESS_PER_BLOCK_REWARD_PERCENT, ONE_HUNDRED_PERCENT)?;
    let content = users.checked_sub(witness)?;

    Ok(RewardSplit {
        dev_team,
        witness,
        content,
    })
}

/// Ledger events produced by block application rather than by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VirtualOperation {
    /// The block producer was paid its share of a source's emission.
    ProducerReward { producer: AccountName, reward: Asset },
    /// An advertising budget ran dry and was closed.
    BudgetClosed { id: u64, owner: Option<AccountName> },
}

/// What one source emitted in a block and where it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEmission {
    pub source: RewardSource,
    pub emitted: Asset,
    pub split: RewardSplit,
}

/// Outcome of distributing one block's rewards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    pub emissions: Vec<SourceEmission>,
    pub operations: Vec<VirtualOperation>,
}

/// Pull one block of emission from every source in `sources`, in order, and
/// route the shares.
pub fn distribute(
    services: &Services,
    block: &BlockContext,
    sources: &[RewardSource],
) -> Result<Distribution> {
    let mut distribution = Distribution::default();

    for &source in sources {
        let emitted = take_emission(services, block, source, &mut distribution.operations)?;
        let split = split_reward(emitted, source.pays_dev_team())?;

        if !split.dev_team.is_zero() {
            services.dev_pool.increase_balance(split.dev_team)?;
        }

        pay_witness(services, &block.witness, split.witness)?;
        if !split.witness.is_zero() {
            distribution.operations.push(VirtualOperation::ProducerReward {
                producer: block.witness.clone(),
                reward: split.witness,
            });
        }

        match split.content.symbol {
            Symbol::Scr => services
                .reward_fund_scr
                .increase_activity_reward(split.content, block.timestamp)?,
            Symbol::Sp => services
                .reward_fund_sp
                .increase_activity_reward(split.content, block.timestamp)?,
        };

        tracing::trace!(
            "Block {}: {:?} emitted {} (dev {}, witness {}, content {})",
            block.number,
            source,
            emitted,
            split.dev_team,
            split.witness,
            split.content
        );
        distribution.emissions.push(SourceEmission {
            source,
            emitted,
            split,
        });
    }

    Ok(distribution)
}

fn take_emission(
    services: &Services,
    block: &BlockContext,
    source: RewardSource,
    operations: &mut Vec<VirtualOperation>,
) -> Result<Asset> {
    match source {
        RewardSource::FundBudget => services.budgets.allocate_fund_budget_cash(block.number),
        RewardSource::AdvertisingBudget(id) => {
            let (emitted, closed) = services.budgets.allocate_cash(id, block.number)?;
            if let Some(budget) = closed {
                operations.push(VirtualOperation::BudgetClosed {
                    id: budget.id,
                    owner: budget.owner,
                });
            }
            Ok(emitted)
        }
        RewardSource::ContentRewardBalancerScr => services.reward_balancer_scr.take_block_reward(),
        RewardSource::ContentRewardBalancerSp => services.reward_balancer_sp.take_block_reward(),
    }
}

fn pay_witness(services: &Services, witness: &AccountName, reward: Asset) -> Result<()> {
    services.accounts.credit(witness, reward)?;
    services.dynamic_global_property.credit_circulating(reward)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_witness_content_split() {
        let split = split_reward(Asset::scr(1_000), false).unwrap();
        assert_eq!(split.dev_team, Asset::scr(0));
        assert_eq!(split.witness, Asset::scr(100));
        assert_eq!(split.content, Asset::scr(900));
    }

    #[test]
    fn test_dev_team_skimmed_first() {
        let split = split_reward(Asset::scr(1_000), true).unwrap();
        assert_eq!(split.dev_team, Asset::scr(100));
        // 10% of the remaining 900, not of the original 1000.
        assert_eq!(split.witness, Asset::scr(90));
        assert_eq!(split.content, Asset::scr(810));
    }

    #[test]
    fn test_small_emission_goes_to_content() {
        let split = split_reward(Asset::sp(9), false).unwrap();
        assert_eq!(split.witness, Asset::sp(0));
        assert_eq!(split.content, Asset::sp(9));
    }

    #[test]
    fn test_only_advertising_pays_dev_team() {
        assert!(RewardSource::AdvertisingBudget(3).pays_dev_team());
        assert!(!RewardSource::FundBudget.pays_dev_team());
        assert!(!RewardSource::ContentRewardBalancerScr.pays_dev_team());
    }

    proptest! {
        #[test]
        fn prop_split_sums_to_emission(amount in 0i64..=i64::MAX / 2, skim in any::<bool>()) {
            let emission = Asset::scr(amount);
            let split = split_reward(emission, skim).unwrap();
            let total = split
                .dev_team
                .checked_add(split.witness)
                .and_then(|a| a.checked_add(split.content))
                .unwrap();
            prop_assert_eq!(total, emission);
            prop_assert!(!split.content.is_negative());
            prop_assert!(split.witness <= split.content);
        }
    }
}
