//! Collateral Ledger Contract
//!
//! Owns per-(user, asset) staking positions and reward accrual. Tracks the
//! staked balance, the portion locked as collateral, and the free balance
//! available for withdrawal or new locks.
//!
//! ## Write paths
//!
//! - `stake` / `unstake`: caller-owned, free balance only
//! - `lock_collateral` / `unlock_collateral` / `liquidate_collateral`:
//!   privileged, callable only by the registered DebtLedger address
//!
//! Reward accrual is settled before every staked-amount mutation, against
//! the pre-mutation snapshot, and the settlement clock is reset atomically
//! with the mutation.

use odra::prelude::*;
use odra::casper_types::{runtime_args, U256};
use odra::CallDef;

use crate::errors::CreditError;
use crate::rewards::accrue_rewards;
use crate::types::{StakePosition, BPS_SCALE};

/// Default collateral ratio (150% = 15000 bps)
const DEFAULT_COLLATERAL_RATIO_BPS: u32 = 15_000;

// Entry-point guard ids (one flag per externally-callable mutating entry)
const ENTRY_STAKE: u8 = 0;
const ENTRY_UNSTAKE: u8 = 1;
const ENTRY_LOCK: u8 = 2;
const ENTRY_UNLOCK: u8 = 3;
const ENTRY_LIQUIDATE: u8 = 4;
const ENTRY_CLAIM: u8 = 5;

/// Collateral Ledger Contract
#[odra::module]
pub struct CollateralLedger {
    /// Protocol admin address
    admin: Var<Address>,
    /// Registered DebtLedger address (sole caller of lock/unlock/liquidate)
    debt_ledger: Var<Option<Address>>,
    /// Yield strategy adapter address (absence degrades to plain custody)
    strategy: Var<Option<Address>>,
    /// Required collateral ratio in bps (10000 = 100%)
    collateral_ratio_bps: Var<u32>,
    /// Assets eligible for staking
    supported_assets: Mapping<Address, bool>,
    /// Staking positions: (user, asset) -> position
    positions: Mapping<(Address, Address), StakePosition>,
    /// Settled reward accrual: (user, asset) -> accrued amount
    accrued_rewards: Mapping<(Address, Address), U256>,
    /// Total staked per asset
    total_staked: Mapping<Address, U256>,
    /// Per-entry-point reentrancy flags
    entry_guards: Mapping<u8, bool>,
}

#[odra::module]
impl CollateralLedger {
    /// Initialize the ledger
    pub fn init(&mut self, admin: Address, collateral_ratio_bps: u32) {
        if collateral_ratio_bps == 0 {
            self.env().revert(CreditError::InvalidConfig);
        }
        self.admin.set(admin);
        self.debt_ledger.set(None);
        self.strategy.set(None);
        self.collateral_ratio_bps.set(collateral_ratio_bps);
    }

    // ========== Staking ==========

    /// Stake a supported asset.
    ///
    /// Settles pending rewards against the pre-stake balance, pulls the
    /// tokens from the caller and forwards them to the yield strategy when
    /// one is configured. Strategy absence skips the forwarding step.
    pub fn stake(&mut self, asset: Address, amount: U256) {
        self.enter(ENTRY_STAKE);

        if !self.is_asset_supported(asset) {
            self.env().revert(CreditError::UnsupportedAsset);
        }
        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let caller = self.env().caller();
        let mut position = self.settle_rewards(caller, asset);

        // Pull tokens from the caller
        let self_address = self.env().self_address();
        self.token_transfer_from(asset, caller, self_address, amount);

        // Forward to the yield strategy when configured
        if let Some(strategy) = self.strategy.get().flatten() {
            self.token_approve(asset, strategy, amount);
            self.strategy_deposit(strategy, asset, amount);
        }

        position.staked = position.staked + amount;
        self.positions.set(&(caller, asset), position);

        let total = self.total_staked.get(&asset).unwrap_or(U256::zero());
        self.total_staked.set(&asset, total + amount);

        self.exit(ENTRY_STAKE);
    }

    /// Withdraw free (unlocked) balance.
    pub fn unstake(&mut self, asset: Address, amount: U256) {
        self.enter(ENTRY_UNSTAKE);

        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let caller = self.env().caller();
        let mut position = self.settle_rewards(caller, asset);

        if amount > position.free() {
            self.env().revert(CreditError::InsufficientFreeBalance);
        }

        position.staked = position.staked - amount;
        self.positions.set(&(caller, asset), position);

        let total = self.total_staked.get(&asset).unwrap_or(U256::zero());
        self.total_staked.set(&asset, total.saturating_sub(amount));

        // Recall from the strategy first, then pay the caller
        if let Some(strategy) = self.strategy.get().flatten() {
            self.strategy_withdraw(strategy, asset, amount);
        }
        self.token_transfer(asset, caller, amount);

        self.exit(ENTRY_UNSTAKE);
    }

    // ========== Privileged Collateral Operations (DebtLedger only) ==========

    /// Reserve free balance as collateral.
    pub fn lock_collateral(&mut self, user: Address, asset: Address, amount: U256) {
        self.enter(ENTRY_LOCK);
        self.require_debt_ledger();

        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let mut position = self.get_position(user, asset);
        if amount > position.free() {
            self.env().revert(CreditError::InsufficientFreeBalance);
        }

        position.locked = position.locked + amount;
        self.positions.set(&(user, asset), position);

        self.exit(ENTRY_LOCK);
    }

    /// Release locked collateral back to the free balance.
    pub fn unlock_collateral(&mut self, user: Address, asset: Address, amount: U256) {
        self.enter(ENTRY_UNLOCK);
        self.require_debt_ledger();

        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let mut position = self.get_position(user, asset);
        if amount > position.locked {
            self.env().revert(CreditError::InsufficientLockedBalance);
        }

        position.locked = position.locked - amount;
        self.positions.set(&(user, asset), position);

        self.exit(ENTRY_UNLOCK);
    }

    /// Seize locked collateral and transfer it to `recipient`.
    ///
    /// Unlike `unlock_collateral` this removes the amount from `staked` as
    /// well; the collateral leaves the ledger permanently.
    pub fn liquidate_collateral(
        &mut self,
        user: Address,
        asset: Address,
        amount: U256,
        recipient: Address,
    ) {
        self.enter(ENTRY_LIQUIDATE);
        self.require_debt_ledger();

        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        // Settle against the pre-seizure staked amount
        let mut position = self.settle_rewards(user, asset);
        if amount > position.locked {
            self.env().revert(CreditError::InsufficientLockedBalance);
        }

        position.locked = position.locked - amount;
        position.staked = position.staked - amount;
        self.positions.set(&(user, asset), position);

        let total = self.total_staked.get(&asset).unwrap_or(U256::zero());
        self.total_staked.set(&asset, total.saturating_sub(amount));

        // Recall from the yield venue first when needed
        if let Some(strategy) = self.strategy.get().flatten() {
            self.strategy_withdraw(strategy, asset, amount);
        }
        self.token_transfer(asset, recipient, amount);

        self.exit(ENTRY_LIQUIDATE);
    }

    // ========== Rewards ==========

    /// Claim accumulated yield rewards through the strategy's
    /// proof-authenticated distributor. The payout goes to the caller.
    pub fn claim_rewards(&mut self, asset: Address, claimable_total: U256, proof: Vec<u8>) -> U256 {
        self.enter(ENTRY_CLAIM);

        let strategy = match self.strategy.get().flatten() {
            Some(s) => s,
            None => self.env().revert(CreditError::StrategyNotConfigured),
        };

        let caller = self.env().caller();
        let paid = self.strategy_claim(strategy, caller, asset, claimable_total, proof);

        // The distributor total is authoritative; the local accrual is a
        // display estimate and is reduced by what was actually paid.
        let accrued = self.accrued_rewards.get(&(caller, asset)).unwrap_or(U256::zero());
        self.accrued_rewards.set(&(caller, asset), accrued.saturating_sub(paid));

        self.exit(ENTRY_CLAIM);
        paid
    }

    /// Rewards settled so far plus the pending un-settled interval.
    pub fn pending_rewards(&self, user: Address, asset: Address) -> U256 {
        let position = self.get_position(user, asset);
        let accrued = self.accrued_rewards.get(&(user, asset)).unwrap_or(U256::zero());

        let apy_bps = self.current_apy(asset);
        let settlement = accrue_rewards(
            position.staked,
            apy_bps,
            position.last_reward_update,
            self.env().get_block_time(),
        );
        accrued + settlement.reward
    }

    // ========== Views ==========

    /// Credit available against the free balance:
    /// `free * 10000 / collateral_ratio_bps`
    pub fn get_available_credit(&self, user: Address, asset: Address) -> U256 {
        let position = self.get_position(user, asset);
        position.free() * U256::from(BPS_SCALE) / U256::from(self.get_collateral_ratio_bps())
    }

    /// Get a staking position (zeroed when absent)
    pub fn get_position(&self, user: Address, asset: Address) -> StakePosition {
        self.positions.get(&(user, asset)).unwrap_or_default()
    }

    /// Settled (not yet claimed) reward accrual
    pub fn get_accrued_rewards(&self, user: Address, asset: Address) -> U256 {
        self.accrued_rewards.get(&(user, asset)).unwrap_or(U256::zero())
    }

    /// Check if an asset is eligible for staking
    pub fn is_asset_supported(&self, asset: Address) -> bool {
        self.supported_assets.get(&asset).unwrap_or(false)
    }

    /// Total staked per asset
    pub fn get_total_staked(&self, asset: Address) -> U256 {
        self.total_staked.get(&asset).unwrap_or(U256::zero())
    }

    /// Required collateral ratio in bps
    pub fn get_collateral_ratio_bps(&self) -> u32 {
        self.collateral_ratio_bps.get().unwrap_or(DEFAULT_COLLATERAL_RATIO_BPS)
    }

    /// Registered DebtLedger address
    pub fn get_debt_ledger(&self) -> Option<Address> {
        self.debt_ledger.get().flatten()
    }

    /// Configured strategy address
    pub fn get_strategy(&self) -> Option<Address> {
        self.strategy.get().flatten()
    }

    /// Admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get().unwrap_or_else(|| self.env().self_address())
    }

    // ========== Admin Functions ==========

    /// Allow an asset for staking (admin only)
    pub fn add_supported_asset(&mut self, asset: Address) {
        self.require_admin();
        self.supported_assets.set(&asset, true);
    }

    /// Remove an asset from the allow-list (admin only).
    ///
    /// Blocks new stakes; existing balances remain withdrawable.
    pub fn remove_supported_asset(&mut self, asset: Address) {
        self.require_admin();
        self.supported_assets.set(&asset, false);
    }

    /// Register the DebtLedger address (admin only)
    pub fn set_debt_ledger(&mut self, debt_ledger: Address) {
        self.require_admin();
        self.debt_ledger.set(Some(debt_ledger));
    }

    /// Register the yield strategy adapter (admin only)
    pub fn set_strategy(&mut self, strategy: Address) {
        self.require_admin();
        self.strategy.set(Some(strategy));
    }

    /// Update the collateral ratio (admin only).
    ///
    /// Applies to credit computed after the change; collateral already
    /// locked for existing debts is never recomputed.
    pub fn set_collateral_ratio(&mut self, ratio_bps: u32) {
        self.require_admin();
        if ratio_bps == 0 {
            self.env().revert(CreditError::InvalidConfig);
        }
        self.collateral_ratio_bps.set(ratio_bps);
    }

    // ========== Internal Functions ==========

    /// Settle reward accrual for (user, asset) up to the current block time
    /// and return the settled position. Must run before any mutation of
    /// `staked` so the reward is computed against the old amount.
    fn settle_rewards(&mut self, user: Address, asset: Address) -> StakePosition {
        let mut position = self.get_position(user, asset);
        let apy_bps = self.current_apy(asset);

        let settlement = accrue_rewards(
            position.staked,
            apy_bps,
            position.last_reward_update,
            self.env().get_block_time(),
        );

        if !settlement.reward.is_zero() {
            let accrued = self.accrued_rewards.get(&(user, asset)).unwrap_or(U256::zero());
            self.accrued_rewards.set(&(user, asset), accrued + settlement.reward);
        }

        position.last_reward_update = settlement.settled_at;
        self.positions.set(&(user, asset), position.clone());
        position
    }

    /// Current APY estimate from the strategy; 0 without a strategy
    fn current_apy(&self, asset: Address) -> u32 {
        match self.strategy.get().flatten() {
            Some(strategy) => {
                let args = runtime_args! {
                    "asset" => asset
                };
                let call_def = CallDef::new("get_apy", false, args);
                self.env().call_contract(strategy, call_def)
            }
            None => 0,
        }
    }

    fn require_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get();
        match admin {
            Some(adm) if caller == adm => {}
            _ => self.env().revert(CreditError::Unauthorized),
        }
    }

    fn require_debt_ledger(&self) {
        let caller = self.env().caller();
        let debt_ledger = self.debt_ledger.get().flatten();
        match debt_ledger {
            Some(ledger) if caller == ledger => {}
            _ => self.env().revert(CreditError::Unauthorized),
        }
    }

    fn enter(&mut self, entry: u8) {
        if self.entry_guards.get(&entry).unwrap_or(false) {
            self.env().revert(CreditError::ReentrantCall);
        }
        self.entry_guards.set(&entry, true);
    }

    fn exit(&mut self, entry: u8) {
        self.entry_guards.set(&entry, false);
    }

    // ----- Cross-contract calls -----

    fn token_transfer_from(&mut self, token: Address, from: Address, to: Address, amount: U256) {
        let args = runtime_args! {
            "owner" => from,
            "recipient" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        let success: bool = self.env().call_contract(token, call_def);
        if !success {
            self.env().revert(CreditError::ExternalCallFailed);
        }
    }

    fn token_transfer(&mut self, token: Address, to: Address, amount: U256) {
        let args = runtime_args! {
            "recipient" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer", true, args);
        let success: bool = self.env().call_contract(token, call_def);
        if !success {
            self.env().revert(CreditError::ExternalCallFailed);
        }
    }

    fn token_approve(&mut self, token: Address, spender: Address, amount: U256) {
        let args = runtime_args! {
            "spender" => spender,
            "amount" => amount
        };
        let call_def = CallDef::new("approve", true, args);
        let success: bool = self.env().call_contract(token, call_def);
        if !success {
            self.env().revert(CreditError::ExternalCallFailed);
        }
    }

    fn strategy_deposit(&mut self, strategy: Address, asset: Address, amount: U256) {
        let args = runtime_args! {
            "asset" => asset,
            "amount" => amount
        };
        let call_def = CallDef::new("deposit", true, args);
        self.env().call_contract::<U256>(strategy, call_def);
    }

    fn strategy_withdraw(&mut self, strategy: Address, asset: Address, amount: U256) {
        let args = runtime_args! {
            "asset" => asset,
            "amount" => amount
        };
        let call_def = CallDef::new("withdraw", true, args);
        self.env().call_contract::<U256>(strategy, call_def);
    }

    fn strategy_claim(
        &mut self,
        strategy: Address,
        recipient: Address,
        reward_asset: Address,
        claimable_total: U256,
        proof: Vec<u8>,
    ) -> U256 {
        let args = runtime_args! {
            "recipient" => recipient,
            "reward_asset" => reward_asset,
            "claimable_total" => claimable_total,
            "proof" => proof
        };
        let call_def = CallDef::new("claim_rewards", true, args);
        self.env().call_contract(strategy, call_def)
    }
}
