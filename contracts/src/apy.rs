//! APY estimation from yield-venue share-price history.
//!
//! The strategy adapter keeps a small fixed-capacity ring of
//! (timestamp, share_price) samples. The estimate compares the newest sample
//! against the oldest one still inside a bounded lookback window and
//! annualizes the realized appreciation linearly. Deliberately simple and
//! conservative; the number only informs credit-line display, never
//! collateral safety math.

use odra::prelude::*;
use odra::casper_types::U256;

use crate::types::YieldSnapshot;

/// Ring capacity (number of retained samples)
pub const SNAPSHOT_CAPACITY: usize = 10;

/// Lookback window for APY estimation (30 days, in seconds)
pub const APY_LOOKBACK_WINDOW: u64 = 30 * 86_400;

/// Minimum interval between snapshot updates (1 day, in seconds)
pub const APY_UPDATE_INTERVAL: u64 = 86_400;

/// Share price scale (1e18)
pub const SHARE_PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Seconds in a year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Basis points scale
pub const BPS_SCALE: u64 = 10_000;

/// Append a sample, evicting the oldest once the ring is full.
///
/// Samples are kept in insertion (chronological) order, oldest first.
pub fn push_snapshot(mut samples: Vec<YieldSnapshot>, sample: YieldSnapshot) -> Vec<YieldSnapshot> {
    if samples.len() >= SNAPSHOT_CAPACITY {
        samples.remove(0);
    }
    samples.push(sample);
    samples
}

/// Find the oldest sample still within the lookback window ending at `now`.
pub fn oldest_in_window(samples: &[YieldSnapshot], now: u64, window: u64) -> Option<YieldSnapshot> {
    samples
        .iter()
        .find(|s| now.saturating_sub(s.timestamp) <= window)
        .copied()
}

/// Estimate the annualized yield in basis points from the sample ring.
///
/// yield_for_period = current_price / oldest_price - 1
/// apy = yield_for_period * (SECONDS_PER_YEAR / elapsed)
///
/// Returns 0 when there are fewer than two usable samples, when no time has
/// elapsed between them, or when the share price has not appreciated.
pub fn estimate_apy_bps(samples: &[YieldSnapshot], now: u64) -> u32 {
    let newest = match samples.last() {
        Some(s) => s,
        None => return 0,
    };
    let oldest = match oldest_in_window(samples, now, APY_LOOKBACK_WINDOW) {
        Some(s) => s,
        None => return 0,
    };

    if newest.timestamp <= oldest.timestamp {
        return 0;
    }
    if oldest.share_price.is_zero() || newest.share_price <= oldest.share_price {
        return 0;
    }

    let elapsed = newest.timestamp - oldest.timestamp;
    let appreciation = newest.share_price - oldest.share_price;

    // apy_bps = appreciation * BPS_SCALE * SECONDS_PER_YEAR / (oldest_price * elapsed)
    let apy = appreciation
        .checked_mul(U256::from(BPS_SCALE))
        .and_then(|v| v.checked_mul(U256::from(SECONDS_PER_YEAR)))
        .and_then(|v| v.checked_div(oldest.share_price))
        .and_then(|v| v.checked_div(U256::from(elapsed)))
        .unwrap_or(U256::zero());

    if apy > U256::from(u32::MAX) {
        u32::MAX
    } else {
        apy.low_u32()
    }
}
