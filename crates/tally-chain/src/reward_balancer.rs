// crates/tally-chain/src/reward_balancer.rs
//
// Reward balancer: a pool with a self-adjusting per-block emission rate.
//
// Once per block the balancer compares its balance with its own daily
// emission (per_day = current_per_block_reward * BLOCKS_PER_DAY):
//
//   balance >  per_day * REWARD_INCREASE_THRESHOLD_IN_DAYS       -> rate += step
//   balance <  per_day * GUARANTEED_REWARD_SUPPLY_PERIOD_IN_DAYS -> rate = max(MIN, rate - step)
//   otherwise                                                    -> rate unchanged
//
// where step = max(MIN, rate * ADJUST_REWARD_PERCENT / 100). Both comparisons
// are strict. The pool then pays out the rate, or its whole remaining balance
// when that is smaller, and never goes negative.

use std::cmp::Ordering;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::{
    min_per_block_reward, ADJUST_REWARD_PERCENT, BLOCKS_PER_DAY,
    GUARANTEED_REWARD_SUPPLY_PERIOD_IN_DAYS, REWARD_INCREASE_THRESHOLD_IN_DAYS,
};
use tally_core::{Asset, Symbol};

use crate::objects::RewardBalancerObject;
use crate::service::{
    expect_credit, ContentRewardBalancerScr, ContentRewardBalancerSp, ServiceBase, Singleton,
};

/// A balancer kind: a singleton slot holding a `RewardBalancerObject` in a
/// fixed symbol.
pub trait BalancerKind: Singleton<Object = RewardBalancerObject> {
    const SYMBOL: Symbol;
}

impl BalancerKind for ContentRewardBalancerScr {
    const SYMBOL: Symbol = Symbol::Scr;
}

impl BalancerKind for ContentRewardBalancerSp {
    const SYMBOL: Symbol = Symbol::Sp;
}

/// Service owning one balancer kind.
pub type RewardBalancerService<K> = ServiceBase<K>;

impl RewardBalancerObject {
    /// Run one block of the feedback controller and pay out.
    ///
    /// Returns the emitted amount. `balance_before == balance_after + emitted`
    /// holds exactly.
    pub fn take_block_reward(&mut self) -> Result<Asset> {
        let symbol = self.balance.symbol;
        let floor = min_per_block_reward(symbol);

        if self.current_per_block_reward.symbol != symbol {
            return Err(TallyError::SymbolMismatch {
                left: symbol,
                right: self.current_per_block_reward.symbol,
            });
        }

        // Thresholds are compared in i128: a rate large enough to overflow
        // the day-multiples in i64 must still leave the chain running.
        let balance = i128::from(self.balance.amount);
        let per_day = i128::from(self.current_per_block_reward.amount) * i128::from(BLOCKS_PER_DAY);
        let increase_threshold = per_day * i128::from(REWARD_INCREASE_THRESHOLD_IN_DAYS);
        let guaranteed_supply = per_day * i128::from(GUARANTEED_REWARD_SUPPLY_PERIOD_IN_DAYS);

        let step = self
            .current_per_block_reward
            .mul_div(ADJUST_REWARD_PERCENT, 100)?
            .try_max(floor)?;

        if balance > increase_threshold {
            self.current_per_block_reward = self.current_per_block_reward.checked_add(step)?;
            tracing::debug!(
                "Balancer rate increased to {} (balance {})",
                self.current_per_block_reward,
                self.balance
            );
        } else if balance < guaranteed_supply {
            self.current_per_block_reward = self
                .current_per_block_reward
                .checked_sub(step)?
                .try_max(floor)?;
            tracing::debug!(
                "Balancer rate decreased to {} (balance {})",
                self.current_per_block_reward,
                self.balance
            );
        }

        let emitted = if self.balance.try_cmp(&self.current_per_block_reward)? != Ordering::Less {
            self.current_per_block_reward
        } else if self.balance.amount > 0 {
            self.balance
        } else {
            Asset::zero(symbol)
        };
        self.balance = self.balance.checked_sub(emitted)?;

        Ok(emitted)
    }
}

impl<K: BalancerKind> ServiceBase<K> {
    /// Create the balancer with its initial supply.
    ///
    /// # Errors
    /// `AlreadyExists` on re-creation, `InvalidSymbol` if the supply is not in
    /// the kind's symbol, `NegativeDelta` for a negative supply.
    pub fn create_balancer(&self, initial_supply: Asset) -> Result<RewardBalancerObject> {
        if self.is_exists() {
            return Err(TallyError::AlreadyExists(K::NAME.to_string()));
        }
        expect_credit(initial_supply, K::SYMBOL)?;
        self.create(|| RewardBalancerObject::new(initial_supply))
    }

    /// Add `delta` to the balance and return the new balance.
    ///
    /// # Errors
    /// `InvalidSymbol` unless `delta` is in the kind's symbol, `NegativeDelta`
    /// if `delta` is negative, `ObjectNotFound` before creation.
    pub fn increase_balance(&self, delta: Asset) -> Result<Asset> {
        expect_credit(delta, K::SYMBOL)?;
        self.update(|pool| {
            pool.balance = pool.balance.checked_add(delta)?;
            Ok(pool.balance)
        })
    }

    /// Adjust the emission rate and take this block's reward, atomically.
    pub fn take_block_reward(&self) -> Result<Asset> {
        let emitted = self.update(|pool| pool.take_block_reward())?;
        tracing::trace!("{} emitted {}", K::NAME, emitted);
        Ok(emitted)
    }
}
