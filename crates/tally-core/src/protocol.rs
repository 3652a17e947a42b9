// crates/tally-core/src/protocol.rs
//
// Protocol constants shared by every node.
//
// Percentages are expressed in basis points of ONE_HUNDRED_PERCENT so that
// splits can be computed with Asset::mul_div without floating point.

use crate::asset::{Asset, Symbol};

/// Decimal places of an asset amount.
pub const ASSET_PRECISION: u32 = 9;

/// Atomic units per whole coin (10^9).
pub const UNITS_PER_COIN: i64 = 1_000_000_000;

/// Target block interval in seconds.
pub const BLOCK_INTERVAL_SECS: u64 = 3;

/// Blocks produced per day at the target interval (24h / 3s).
pub const BLOCKS_PER_DAY: i64 = 24 * 60 * 60 / BLOCK_INTERVAL_SECS as i64;

/// 100% in basis points.
pub const ONE_HUNDRED_PERCENT: i64 = 10_000;

/// 1% in basis points.
pub const ONE_PERCENT: i64 = ONE_HUNDRED_PERCENT / 100;

/// Share of each block's user reward credited to the producing witness.
pub const WITNESS_PER_BLOCK_REWARD_PERCENT: i64 = 10 * ONE_PERCENT;

/// Share of advertising-budget emission skimmed for the dev pool before the
/// witness/content split.
pub const DEV_TEAM_PER_BLOCK_REWARD_PERCENT: i64 = 10 * ONE_PERCENT;

/// Relative step of a balancer rate adjustment, applied as `/ 100`.
pub const ADJUST_REWARD_PERCENT: i64 = 5;

/// A balancer holding more than this many days of emission accelerates.
pub const REWARD_INCREASE_THRESHOLD_IN_DAYS: i64 = 100;

/// A balancer holding less than this many days of emission decelerates.
pub const GUARANTEED_REWARD_SUPPLY_PERIOD_IN_DAYS: i64 = 30;

/// Floor (and seed) of a balancer's per-block reward, in atomic units.
pub const MIN_PER_BLOCK_REWARD: i64 = 1;

/// Blocks behind head after which a block is considered irreversible.
pub const IRREVERSIBLE_BLOCK_DEPTH: u64 = 21;

/// Blocks a registration bonus record stays attached to a new account.
pub const REGISTRATION_BONUS_LOCK_BLOCKS: u64 = 7 * BLOCKS_PER_DAY as u64;

/// `MIN_PER_BLOCK_REWARD` as an asset of the given symbol.
pub const fn min_per_block_reward(symbol: Symbol) -> Asset {
    Asset::new(MIN_PER_BLOCK_REWARD, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_per_day() {
        assert_eq!(BLOCKS_PER_DAY, 28_800);
    }

    #[test]
    fn test_percent_scale() {
        assert_eq!(ONE_PERCENT, 100);
        assert_eq!(WITNESS_PER_BLOCK_REWARD_PERCENT, 1_000);
    }
}
