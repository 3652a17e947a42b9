// crates/tally-chain/src/reward_fund.rs
//
// Content reward funds, one per symbol. Each accumulates the content share
// of every block's emission in that symbol. The bounty fund has the same
// shape, holds SP, and is not fed by block emission.

use chrono::{DateTime, Utc};

use tally_core::error::Result;
use tally_core::{Asset, Symbol};

use crate::objects::ContentRewardFundObject;
use crate::service::{
    expect_credit, ContentRewardFundScr, ContentRewardFundSp, FifaWorldCup2018BountyRewardFund,
    ServiceBase, Singleton,
};

/// A content reward fund kind in a fixed symbol.
pub trait RewardFundKind: Singleton<Object = ContentRewardFundObject> {
    const SYMBOL: Symbol;
}

impl RewardFundKind for ContentRewardFundScr {
    const SYMBOL: Symbol = Symbol::Scr;
}

impl RewardFundKind for ContentRewardFundSp {
    const SYMBOL: Symbol = Symbol::Sp;
}

impl RewardFundKind for FifaWorldCup2018BountyRewardFund {
    const SYMBOL: Symbol = Symbol::Sp;
}

pub type RewardFundService<K> = ServiceBase<K>;

impl<K: RewardFundKind> ServiceBase<K> {
    /// Create the fund empty.
    pub fn create_fund(&self, now: DateTime<Utc>) -> Result<ContentRewardFundObject> {
        self.create(|| ContentRewardFundObject {
            activity_reward_balance: Asset::zero(K::SYMBOL),
            last_update: now,
        })
    }

    /// Credit the activity reward balance; returns the new balance.
    pub fn increase_activity_reward(&self, delta: Asset, now: DateTime<Utc>) -> Result<Asset> {
        expect_credit(delta, K::SYMBOL)?;
        self.update(|fund| {
            fund.activity_reward_balance = fund.activity_reward_balance.checked_add(delta)?;
            fund.last_update = now;
            Ok(fund.activity_reward_balance)
        })
    }
}
