//! Common types used across the pay-later protocol.

use odra::prelude::*;
use odra::casper_types::U256;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u64 = 10_000;

/// Per-(user, asset) staking position.
///
/// `locked` is always a subset of `staked`; `staked - locked` is the free
/// balance available for withdrawal or new collateral locks.
#[odra::odra_type]
#[derive(Default)]
pub struct StakePosition {
    /// Total deposited amount (in the asset's smallest unit)
    pub staked: U256,
    /// Portion of `staked` reserved as collateral
    pub locked: U256,
    /// Last reward settlement timestamp
    pub last_reward_update: u64,
}

impl StakePosition {
    /// Free balance: `staked - locked`
    pub fn free(&self) -> U256 {
        self.staked.saturating_sub(self.locked)
    }

    pub fn is_empty(&self) -> bool {
        self.staked.is_zero() && self.locked.is_zero()
    }
}

/// Debt lifecycle state. `Repaid` and `Liquidated` are terminal.
#[odra::odra_type]
#[derive(Copy)]
pub enum DebtState {
    /// Credit extended, awaiting repayment
    Open,
    /// Repaid by the borrower
    Repaid,
    /// Collateral seized after missed deadline
    Liquidated,
}

/// Debt record
#[odra::odra_type]
pub struct DebtData {
    /// Unique debt id (monotonically increasing, starts at 1)
    pub debt_id: u64,
    /// Borrower whose collateral backs the debt
    pub borrower: Address,
    /// Merchant paid at creation
    pub merchant: Address,
    /// Asset the merchant is paid in
    pub payment_asset: Address,
    /// Amount owed by the borrower (merchant receives this minus the fee)
    pub payment_amount: U256,
    /// Asset locked as collateral
    pub collateral_asset: Address,
    /// Collateral locked at creation; fixed for the life of the debt
    pub collateral_amount: U256,
    /// Creation timestamp
    pub created_at: u64,
    /// Repayment deadline; late repayment and liquidation apply the penalty
    pub deadline: u64,
    /// Penalty rate snapshot taken at creation, in bps
    pub penalty_bps: u32,
    /// Current state
    pub state: DebtState,
}

impl DebtData {
    pub fn is_open(&self) -> bool {
        matches!(self.state, DebtState::Open)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, DebtState::Repaid | DebtState::Liquidated)
    }
}

/// Credit terms applied to newly created debts
#[odra::odra_type]
pub struct CreditTerms {
    /// Platform fee in bps, deducted from the merchant payout
    pub fee_bps: u32,
    /// Late-repayment penalty in bps of the payment amount
    pub penalty_bps: u32,
    /// Minimum repayment period in seconds (inclusive)
    pub min_period: u64,
    /// Maximum repayment period in seconds (inclusive)
    pub max_period: u64,
}

/// One share-price observation used for APY estimation
#[odra::odra_type]
#[derive(Copy)]
pub struct YieldSnapshot {
    /// Observation timestamp in seconds
    pub timestamp: u64,
    /// Venue share price, scaled by 1e18 (assets per one 1e18 share unit)
    pub share_price: U256,
}
