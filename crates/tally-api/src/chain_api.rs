// crates/tally-api/src/chain_api.rs
//
// Chain API: chain properties, scheduled hardfork, reward funds, and chain
// capital. Each call reads everything it needs under a single shared lock.

use std::sync::Arc;

use tally_chain::service::{
    ContentRewardBalancerScr, ContentRewardFundScr, ContentRewardFundSp, DynamicGlobalProperty,
    FifaWorldCup2018BountyRewardFund, FundBudget, HardforkProperty, RegistrationPool, Singleton,
};
use tally_chain::ChainDatabase;
use tally_core::error::Result;

use crate::objects::{
    ChainCapitalApiObj, ChainPropertiesApiObj, RewardFundApiObj, RewardFundType,
    ScheduledHardforkApiObj,
};

/// Read-only view of a chain database.
#[derive(Clone)]
pub struct ChainApi {
    chain: Arc<ChainDatabase>,
}

impl ChainApi {
    pub fn new(chain: Arc<ChainDatabase>) -> Self {
        Self { chain }
    }

    /// Head block, irreversibility, producer, and version information.
    pub fn get_chain_properties(&self) -> Result<ChainPropertiesApiObj> {
        self.chain.with_read_lock(|state| -> Result<ChainPropertiesApiObj> {
            let dgp = DynamicGlobalProperty::get_in(state)?;
            let hardfork = HardforkProperty::get_in(state)?;
            Ok(ChainPropertiesApiObj {
                chain_id: state.chain_id,
                head_block_id: dgp.head_block_id,
                head_block_number: dgp.head_block_number,
                last_irreversible_block_number: dgp.last_irreversible_block_num,
                current_aslot: dgp.current_aslot,
                time: dgp.time,
                current_witness: dgp.current_witness.clone(),
                majority_version: dgp.majority_version,
                hf_version: hardfork.current_hardfork_version,
                median_chain_props: dgp.median_chain_props.clone(),
            })
        })
    }

    pub fn get_next_scheduled_hardfork(&self) -> Result<ScheduledHardforkApiObj> {
        self.chain.with_read_lock(|state| -> Result<ScheduledHardforkApiObj> {
            let hardfork = HardforkProperty::get_in(state)?;
            Ok(ScheduledHardforkApiObj {
                hf_version: hardfork.next_hardfork,
                live_time: hardfork.next_hardfork_time,
            })
        })
    }

    /// One content reward fund.
    ///
    /// # Errors
    /// `ObjectNotFound` if the fund has not been created.
    pub fn get_reward_fund(&self, fund: RewardFundType) -> Result<RewardFundApiObj> {
        self.chain.with_read_lock(|state| -> Result<RewardFundApiObj> {
            let object = match fund {
                RewardFundType::RewardFundScr => ContentRewardFundScr::get_in(state)?,
                RewardFundType::RewardFundSp => ContentRewardFundSp::get_in(state)?,
                RewardFundType::FifaWorldCup2018BountyRewardFund => {
                    FifaWorldCup2018BountyRewardFund::get_in(state)?
                }
            };
            Ok(RewardFundApiObj::new(fund, object))
        })
    }

    /// `get_reward_fund` keyed by name, for callers holding untyped input.
    ///
    /// # Errors
    /// `UnknownFund` for a name outside the closed set of funds.
    pub fn get_reward_fund_by_name(&self, name: &str) -> Result<RewardFundApiObj> {
        let fund = name.parse::<RewardFundType>().inspect_err(|e| {
            tracing::debug!("get_reward_fund rejected: {}", e);
        })?;
        self.get_reward_fund(fund)
    }

    /// Totals of the supply and of every pool holding part of it.
    pub fn get_chain_capital(&self) -> Result<ChainCapitalApiObj> {
        self.chain.with_read_lock(|state| -> Result<ChainCapitalApiObj> {
            let dgp = DynamicGlobalProperty::get_in(state)?;
            Ok(ChainCapitalApiObj {
                total_supply: dgp.total_supply,
                circulating_capital: dgp.circulating_capital,
                total_scorumpower: dgp.total_scorumpower,
                registration_pool_balance: RegistrationPool::get_in(state)?.balance,
                fund_budget_balance: FundBudget::get_in(state)?.balance,
                reward_pool_balance: ContentRewardBalancerScr::get_in(state)?.balance,
                content_reward_scr_balance: ContentRewardFundScr::get_in(state)?
                    .activity_reward_balance,
                content_reward_sp_balance: ContentRewardFundSp::get_in(state)?
                    .activity_reward_balance,
            })
        })
    }
}
