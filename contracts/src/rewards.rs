//! Reward accrual model for staked collateral.
//!
//! Rewards accrue linearly (simple, non-compounding) against the staked
//! amount at the strategy's current APY estimate. Settlement always runs
//! against the pre-mutation staked snapshot, and the elapsed-time clock is
//! reset atomically with the mutation, so interleaved stake/unstake calls
//! never double-count an interval.

use odra::prelude::*;
use odra::casper_types::U256;

/// Seconds in a year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u64 = 10_000;

/// Reward settlement result
#[odra::odra_type]
pub struct RewardSettlement {
    /// Reward earned over the settled interval
    pub reward: U256,
    /// Timestamp the interval was settled up to
    pub settled_at: u64,
}

/// Calculate the reward earned by a staked balance over an interval.
///
/// Uses the simple interest formula: reward = staked * apy * t
/// Where:
/// - staked = the staked amount over the whole interval
/// - apy = annual yield estimate (as a fraction, from bps)
/// - t = elapsed time as a fraction of a year
///
/// # Arguments
/// * `staked` - Staked amount at the start of the interval
/// * `apy_bps` - Annualized yield estimate in basis points
/// * `last_update` - Timestamp rewards were last settled at
/// * `current_timestamp` - Current block timestamp
pub fn accrue_rewards(
    staked: U256,
    apy_bps: u32,
    last_update: u64,
    current_timestamp: u64,
) -> RewardSettlement {
    // No accrual if no time has passed; never rewind the settlement clock
    if current_timestamp <= last_update {
        return RewardSettlement {
            reward: U256::zero(),
            settled_at: last_update,
        };
    }

    // No accrual if nothing staked or zero yield
    if staked.is_zero() || apy_bps == 0 {
        return RewardSettlement {
            reward: U256::zero(),
            settled_at: current_timestamp,
        };
    }

    let elapsed_seconds = current_timestamp - last_update;

    // reward = staked * apy_bps * elapsed / (BPS_SCALE * SECONDS_PER_YEAR)
    let reward = staked
        .checked_mul(U256::from(apy_bps))
        .and_then(|v| v.checked_mul(U256::from(elapsed_seconds)))
        .and_then(|v| v.checked_div(U256::from(BPS_SCALE)))
        .and_then(|v| v.checked_div(U256::from(SECONDS_PER_YEAR)))
        .unwrap_or(U256::zero());

    RewardSettlement {
        reward,
        settled_at: current_timestamp,
    }
}
