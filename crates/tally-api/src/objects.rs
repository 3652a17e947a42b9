// crates/tally-api/src/objects.rs
//
// API objects returned by the chain API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_chain::objects::ContentRewardFundObject;
use tally_core::error::{Result, TallyError};
use tally_core::{AccountName, Asset, BlockId, ChainId, ChainProperties, Version};

// ---------------------------------------------------------------------------
// get_chain_properties
// ---------------------------------------------------------------------------

/// Snapshot of the chain head and protocol versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPropertiesApiObj {
    pub chain_id: ChainId,
    pub head_block_id: BlockId,
    pub head_block_number: u64,
    pub last_irreversible_block_number: u64,
    pub current_aslot: u64,
    pub time: DateTime<Utc>,
    pub current_witness: AccountName,
    pub majority_version: Version,
    pub hf_version: Version,
    pub median_chain_props: ChainProperties,
}

// ---------------------------------------------------------------------------
// get_next_scheduled_hardfork
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledHardforkApiObj {
    pub hf_version: Version,
    pub live_time: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// get_reward_fund
// ---------------------------------------------------------------------------

/// The closed set of reward fund kinds served by `get_reward_fund`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardFundType {
    RewardFundScr,
    RewardFundSp,
    FifaWorldCup2018BountyRewardFund,
}

impl RewardFundType {
    pub const ALL: [RewardFundType; 3] = [
        RewardFundType::RewardFundScr,
        RewardFundType::RewardFundSp,
        RewardFundType::FifaWorldCup2018BountyRewardFund,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RewardFundType::RewardFundScr => "reward_fund_scr",
            RewardFundType::RewardFundSp => "reward_fund_sp",
            RewardFundType::FifaWorldCup2018BountyRewardFund => {
                "fifa_world_cup_2018_bounty_reward_fund"
            }
        }
    }
}

impl fmt::Display for RewardFundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RewardFundType {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reward_fund_scr" | "scr" => Ok(RewardFundType::RewardFundScr),
            "reward_fund_sp" | "sp" => Ok(RewardFundType::RewardFundSp),
            "fifa_world_cup_2018_bounty_reward_fund" => {
                Ok(RewardFundType::FifaWorldCup2018BountyRewardFund)
            }
            other => Err(TallyError::UnknownFund(other.to_string())),
        }
    }
}

impl TryFrom<u8> for RewardFundType {
    type Error = TallyError;

    /// Numeric fund ids as used on the wire.
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RewardFundType::RewardFundScr),
            1 => Ok(RewardFundType::RewardFundSp),
            2 => Ok(RewardFundType::FifaWorldCup2018BountyRewardFund),
            other => Err(TallyError::UnknownFund(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardFundApiObj {
    pub fund: RewardFundType,
    pub activity_reward_balance: Asset,
    pub last_update: DateTime<Utc>,
}

impl RewardFundApiObj {
    pub fn new(fund: RewardFundType, object: &ContentRewardFundObject) -> Self {
        Self {
            fund,
            activity_reward_balance: object.activity_reward_balance,
            last_update: object.last_update,
        }
    }
}

// ---------------------------------------------------------------------------
// get_chain_capital
// ---------------------------------------------------------------------------

/// Where the supply currently sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCapitalApiObj {
    pub total_supply: Asset,
    pub circulating_capital: Asset,
    pub total_scorumpower: Asset,
    pub registration_pool_balance: Asset,
    pub fund_budget_balance: Asset,
    /// Balance of the SCR content reward balancer.
    pub reward_pool_balance: Asset,
    pub content_reward_scr_balance: Asset,
    pub content_reward_sp_balance: Asset,
}
