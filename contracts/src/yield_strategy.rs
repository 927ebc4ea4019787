//! Yield Strategy Adapter Contract
//!
//! Wraps a single external shares-based yield venue for one designated
//! asset. Deposits mint venue shares at the live exchange rate; withdrawals
//! convert the requested asset amount back to shares at the live rate and
//! redeem them.
//!
//! The adapter keeps no per-user share ledger: it aggregates all shares it
//! holds and converts withdrawal requests through the venue's current rate.
//! With multiple depositors moving out of lock-step with rate changes this
//! is not strictly proportional; in this protocol the CollateralLedger is
//! the only authorized depositor, which makes the pool single-owner in
//! practice.
//!
//! APY estimation samples the venue share price into a small ring buffer on
//! a throttled cadence and annualizes realized appreciation linearly.

use odra::prelude::*;
use odra::casper_types::{runtime_args, U256};
use odra::CallDef;

use crate::apy::{
    estimate_apy_bps, push_snapshot, APY_UPDATE_INTERVAL, SHARE_PRICE_SCALE,
};
use crate::errors::CreditError;
use crate::types::YieldSnapshot;

// Entry-point guard ids
const ENTRY_DEPOSIT: u8 = 0;
const ENTRY_WITHDRAW: u8 = 1;
const ENTRY_CLAIM: u8 = 2;

/// Yield Strategy Adapter Contract
#[odra::module]
pub struct YieldStrategy {
    /// Admin address
    admin: Var<Address>,
    /// The one asset this adapter manages
    asset: Var<Address>,
    /// External yield vault address
    vault: Var<Option<Address>>,
    /// Proof-authenticated reward distributor address
    distributor: Var<Option<Address>>,
    /// Callers allowed to move funds through the adapter
    authorized_callers: Mapping<Address, bool>,
    /// Aggregate vault shares held by the adapter
    total_shares: Var<U256>,
    /// Share-price history for APY estimation (oldest first)
    snapshots: Var<Vec<YieldSnapshot>>,
    /// Most recent APY estimate in bps
    last_apy_bps: Var<u32>,
    /// Timestamp of the last snapshot update
    last_apy_update: Var<u64>,
    /// Per-entry-point reentrancy flags
    entry_guards: Mapping<u8, bool>,
}

#[odra::module]
impl YieldStrategy {
    /// Initialize the adapter for one asset and venue
    pub fn init(&mut self, admin: Address, asset: Address, vault: Address) {
        self.admin.set(admin);
        self.asset.set(asset);
        self.vault.set(Some(vault));
        self.distributor.set(None);
        self.total_shares.set(U256::zero());
        self.snapshots.set(Vec::new());
        self.last_apy_bps.set(0);
        self.last_apy_update.set(0);
    }

    // ========== Fund Movement (Authorized Callers) ==========

    /// Deposit the designated asset into the yield venue.
    ///
    /// Pulls the tokens from the caller (requires prior approval), forwards
    /// them to the vault and records the minted shares.
    ///
    /// # Returns
    /// * Shares minted by the venue
    pub fn deposit(&mut self, asset: Address, amount: U256) -> U256 {
        self.enter(ENTRY_DEPOSIT);
        self.require_authorized_caller();
        self.require_designated_asset(asset);

        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let vault = self.require_vault();
        let caller = self.env().caller();
        let self_address = self.env().self_address();

        self.token_transfer_from(asset, caller, self_address, amount);
        self.token_approve(asset, vault, amount);

        let shares = self.vault_deposit_assets(vault, amount);
        let held = self.total_shares.get().unwrap_or(U256::zero());
        self.total_shares.set(held + shares);

        self.update_apy_internal();

        self.exit(ENTRY_DEPOSIT);
        shares
    }

    /// Withdraw the designated asset from the yield venue.
    ///
    /// The requested asset amount is converted to shares at the venue's
    /// live rate and those shares are redeemed; the redeemed assets go to
    /// the caller.
    ///
    /// # Returns
    /// * Assets paid out by the venue
    pub fn withdraw(&mut self, asset: Address, amount: U256) -> U256 {
        self.enter(ENTRY_WITHDRAW);
        self.require_authorized_caller();
        self.require_designated_asset(asset);

        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let vault = self.require_vault();
        let shares = self.vault_convert_to_shares(vault, amount);

        let held = self.total_shares.get().unwrap_or(U256::zero());
        if shares > held {
            self.env().revert(CreditError::InvalidAmount);
        }
        self.total_shares.set(held - shares);

        let assets_out = self.vault_redeem_shares(vault, shares);

        let caller = self.env().caller();
        self.token_transfer(asset, caller, assets_out);

        self.update_apy_internal();

        self.exit(ENTRY_WITHDRAW);
        assets_out
    }

    // ========== Rewards ==========

    /// Claim incentive rewards through the external distributor and forward
    /// the payout to `recipient`.
    ///
    /// The claimable total is computed off-ledger; the proof authenticates
    /// it at claim time. The adapter holds no claim bookkeeping of its own.
    pub fn claim_rewards(
        &mut self,
        recipient: Address,
        reward_asset: Address,
        claimable_total: U256,
        proof: Vec<u8>,
    ) -> U256 {
        self.enter(ENTRY_CLAIM);
        self.require_authorized_caller();

        let distributor = match self.distributor.get().flatten() {
            Some(d) => d,
            None => self.env().revert(CreditError::StrategyNotConfigured),
        };

        let self_address = self.env().self_address();
        let paid = self.distributor_claim(
            distributor,
            self_address,
            reward_asset,
            claimable_total,
            proof,
        );

        if !paid.is_zero() {
            self.token_transfer(reward_asset, recipient, paid);
        }

        self.exit(ENTRY_CLAIM);
        paid
    }

    // ========== APY Estimation ==========

    /// Most recent APY estimate in bps; 0 for any asset this adapter does
    /// not manage.
    pub fn get_apy(&self, asset: Address) -> u32 {
        match self.asset.get() {
            Some(designated) if designated == asset => {
                self.last_apy_bps.get().unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Recompute the APY estimate.
    ///
    /// Throttled: mutates the snapshot ring at most once per update
    /// interval no matter how often deposits and withdrawals invoke it.
    pub fn update_apy(&mut self) {
        self.update_apy_internal();
    }

    // ========== Views ==========

    /// Aggregate vault shares held
    pub fn get_total_shares(&self) -> U256 {
        self.total_shares.get().unwrap_or(U256::zero())
    }

    /// The designated asset
    pub fn get_designated_asset(&self) -> Address {
        self.asset.get().unwrap_or_else(|| self.env().self_address())
    }

    /// Configured vault address
    pub fn get_vault(&self) -> Option<Address> {
        self.vault.get().flatten()
    }

    /// Configured distributor address
    pub fn get_distributor(&self) -> Option<Address> {
        self.distributor.get().flatten()
    }

    /// Number of retained share-price samples
    pub fn get_snapshot_count(&self) -> u32 {
        self.snapshots.get().unwrap_or_default().len() as u32
    }

    /// Timestamp of the last snapshot update
    pub fn get_last_apy_update(&self) -> u64 {
        self.last_apy_update.get().unwrap_or(0)
    }

    /// Check caller authorization
    pub fn is_authorized_caller(&self, caller: Address) -> bool {
        self.authorized_callers.get(&caller).unwrap_or(false)
    }

    /// Admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get().unwrap_or_else(|| self.env().self_address())
    }

    // ========== Admin Functions ==========

    /// Re-point the yield vault (admin only)
    pub fn set_vault(&mut self, vault: Address) {
        self.require_admin();
        self.vault.set(Some(vault));
    }

    /// Set the reward distributor (admin only)
    pub fn set_distributor(&mut self, distributor: Address) {
        self.require_admin();
        self.distributor.set(Some(distributor));
    }

    /// Authorize a caller to move funds (admin only)
    pub fn add_authorized_caller(&mut self, caller: Address) {
        self.require_admin();
        self.authorized_callers.set(&caller, true);
    }

    /// Remove a caller authorization (admin only)
    pub fn remove_authorized_caller(&mut self, caller: Address) {
        self.require_admin();
        self.authorized_callers.set(&caller, false);
    }

    // ========== Internal Functions ==========

    fn update_apy_internal(&mut self) {
        let now = self.env().get_block_time();
        let last = self.last_apy_update.get().unwrap_or(0);
        let samples = self.snapshots.get().unwrap_or_default();

        // Throttle once the first sample exists, no matter how often
        // deposits and withdrawals trigger a recomputation
        if !samples.is_empty() && now.saturating_sub(last) < APY_UPDATE_INTERVAL {
            return;
        }

        let vault = match self.vault.get().flatten() {
            Some(v) => v,
            None => return,
        };

        let share_price = self.vault_convert_to_assets(vault, U256::from(SHARE_PRICE_SCALE));
        let samples = push_snapshot(
            samples,
            YieldSnapshot {
                timestamp: now,
                share_price,
            },
        );

        let apy_bps = estimate_apy_bps(&samples, now);
        self.snapshots.set(samples);
        self.last_apy_bps.set(apy_bps);
        self.last_apy_update.set(now);
    }

    fn require_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get();
        match admin {
            Some(adm) if caller == adm => {}
            _ => self.env().revert(CreditError::Unauthorized),
        }
    }

    fn require_authorized_caller(&self) {
        let caller = self.env().caller();

        // Admin is implicitly authorized
        if let Some(admin) = self.admin.get() {
            if caller == admin {
                return;
            }
        }

        if !self.is_authorized_caller(caller) {
            self.env().revert(CreditError::Unauthorized);
        }
    }

    fn require_designated_asset(&self, asset: Address) {
        match self.asset.get() {
            Some(designated) if designated == asset => {}
            _ => self.env().revert(CreditError::UnsupportedAsset),
        }
    }

    fn require_vault(&self) -> Address {
        match self.vault.get().flatten() {
            Some(v) => v,
            None => self.env().revert(CreditError::StrategyNotConfigured),
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

    fn vault_deposit_assets(&mut self, vault: Address, amount: U256) -> U256 {
        let args = runtime_args! {
            "amount" => amount
        };
        let call_def = CallDef::new("deposit_assets", true, args);
        self.env().call_contract(vault, call_def)
    }

    fn vault_redeem_shares(&mut self, vault: Address, shares: U256) -> U256 {
        let args = runtime_args! {
            "shares" => shares
        };
        let call_def = CallDef::new("redeem_shares", true, args);
        self.env().call_contract(vault, call_def)
    }

    fn vault_convert_to_shares(&self, vault: Address, assets: U256) -> U256 {
        let args = runtime_args! {
            "assets" => assets
        };
        let call_def = CallDef::new("convert_to_shares", false, args);
        self.env().call_contract(vault, call_def)
    }

    fn vault_convert_to_assets(&self, vault: Address, shares: U256) -> U256 {
        let args = runtime_args! {
            "shares" => shares
        };
        let call_def = CallDef::new("convert_to_assets", false, args);
        self.env().call_contract(vault, call_def)
    }

    fn distributor_claim(
        &mut self,
        distributor: Address,
        account: Address,
        reward_asset: Address,
        claimable_total: U256,
        proof: Vec<u8>,
    ) -> U256 {
        let args = runtime_args! {
            "account" => account,
            "reward_asset" => reward_asset,
            "claimable_total" => claimable_total,
            "proof" => proof
        };
        let call_def = CallDef::new("claim", true, args);
        self.env().call_contract(distributor, call_def)
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
}
