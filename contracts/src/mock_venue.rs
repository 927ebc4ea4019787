//! External-venue stand-ins for tests and demo deployments.
//!
//! The protocol treats the yield vault and the reward distributor as
//! external collaborators; these modules implement their wire contracts so
//! the system can run end-to-end on the test VM and on testnet without the
//! real venue.

use odra::prelude::*;
use odra::casper_types::{runtime_args, U256};
use odra::CallDef;

use crate::errors::CreditError;

/// Shares-based yield vault over one CEP-18 asset.
///
/// Deposits mint shares at the current exchange rate and redemptions burn
/// them at the same rate. `donate` adds assets without minting shares,
/// raising the share price the way venue yield would.
#[odra::module]
pub struct MockYieldVault {
    /// Underlying CEP-18 asset
    asset: Var<Address>,
    /// Total shares minted
    total_shares: Var<U256>,
    /// Total assets backing the shares
    total_assets: Var<U256>,
    /// Share balances per depositor
    balances: Mapping<Address, U256>,
}

#[odra::module]
impl MockYieldVault {
    /// Initialize the vault for one asset
    pub fn init(&mut self, asset: Address) {
        self.asset.set(asset);
        self.total_shares.set(U256::zero());
        self.total_assets.set(U256::zero());
    }

    /// Deposit assets, minting shares at the current rate.
    ///
    /// Requires prior approval; pulls the assets from the caller.
    pub fn deposit_assets(&mut self, amount: U256) -> U256 {
        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let shares = self.convert_to_shares(amount);

        let caller = self.env().caller();
        let self_address = self.env().self_address();
        self.token_transfer_from(caller, self_address, amount);

        let balance = self.balance_of(caller);
        self.balances.set(&caller, balance + shares);
        self.total_shares.set(self.total_shares() + shares);
        self.total_assets.set(self.get_total_assets() + amount);

        shares
    }

    /// Redeem shares for assets at the current rate
    pub fn redeem_shares(&mut self, shares: U256) -> U256 {
        if shares.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let caller = self.env().caller();
        let balance = self.balance_of(caller);
        if balance < shares {
            self.env().revert(CreditError::InsufficientTokenBalance);
        }

        let assets = self.convert_to_assets(shares);

        self.balances.set(&caller, balance - shares);
        self.total_shares.set(self.total_shares() - shares);
        self.total_assets.set(self.get_total_assets() - assets);

        self.token_transfer(caller, assets);
        assets
    }

    /// Convert assets to shares at the current rate
    pub fn convert_to_shares(&self, assets: U256) -> U256 {
        let total_shares = self.total_shares();
        let total_assets = self.get_total_assets();

        if total_shares.is_zero() {
            return assets; // Bootstrap 1:1
        }
        if total_assets.is_zero() {
            return U256::zero();
        }
        assets * total_shares / total_assets
    }

    /// Convert shares to assets at the current rate
    pub fn convert_to_assets(&self, shares: U256) -> U256 {
        let total_shares = self.total_shares();
        if total_shares.is_zero() {
            return shares; // Bootstrap 1:1
        }
        shares * self.get_total_assets() / total_shares
    }

    /// Total shares minted
    pub fn total_shares(&self) -> U256 {
        self.total_shares.get().unwrap_or(U256::zero())
    }

    /// Total assets backing the shares
    pub fn get_total_assets(&self) -> U256 {
        self.total_assets.get().unwrap_or(U256::zero())
    }

    /// Share balance of a depositor
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    /// Add assets without minting shares, raising the share price the way
    /// venue yield would. Pulls the assets from the caller.
    pub fn donate(&mut self, amount: U256) {
        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let caller = self.env().caller();
        let self_address = self.env().self_address();
        self.token_transfer_from(caller, self_address, amount);
        self.total_assets.set(self.get_total_assets() + amount);
    }

    // ========== Internal Functions ==========

    fn token_transfer_from(&mut self, from: Address, to: Address, amount: U256) {
        let asset = self.asset.get().unwrap_or_else(|| self.env().self_address());
        let args = runtime_args! {
            "owner" => from,
            "recipient" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        let success: bool = self.env().call_contract(asset, call_def);
        if !success {
            self.env().revert(CreditError::ExternalCallFailed);
        }
    }

    fn token_transfer(&mut self, to: Address, amount: U256) {
        let asset = self.asset.get().unwrap_or_else(|| self.env().self_address());
        let args = runtime_args! {
            "recipient" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer", true, args);
        let success: bool = self.env().call_contract(asset, call_def);
        if !success {
            self.env().revert(CreditError::ExternalCallFailed);
        }
    }
}

/// Proof-authenticated reward distributor stand-in.
///
/// The admin records each account's claimable total together with a proof
/// commitment computed off-ledger. `claim` authenticates both and pays out
/// once. Funding happens by plain token transfer to this contract.
#[odra::module]
pub struct MockRewardDistributor {
    /// Admin address
    admin: Var<Address>,
    /// Claimable totals per account
    claimable: Mapping<Address, U256>,
    /// Proof commitments per account
    commitments: Mapping<Address, Vec<u8>>,
    /// Spent claims
    claimed: Mapping<Address, bool>,
}

#[odra::module]
impl MockRewardDistributor {
    /// Initialize the distributor
    pub fn init(&mut self, admin: Address) {
        self.admin.set(admin);
    }

    /// Record a claim for an account (admin only)
    pub fn set_claim(&mut self, account: Address, claimable_total: U256, commitment: Vec<u8>) {
        self.require_admin();
        self.claimable.set(&account, claimable_total);
        self.commitments.set(&account, commitment);
        self.claimed.set(&account, false);
    }

    /// Claim a recorded reward.
    ///
    /// The supplied total and proof must match the recorded commitment;
    /// each claim pays once.
    pub fn claim(
        &mut self,
        account: Address,
        reward_asset: Address,
        claimable_total: U256,
        proof: Vec<u8>,
    ) -> U256 {
        if self.claimed.get(&account).unwrap_or(false) {
            self.env().revert(CreditError::AlreadySettled);
        }

        let expected_total = self.claimable.get(&account).unwrap_or(U256::zero());
        let expected_proof = self.commitments.get(&account).unwrap_or_default();
        if expected_total.is_zero()
            || claimable_total != expected_total
            || proof != expected_proof
        {
            self.env().revert(CreditError::Unauthorized);
        }

        self.claimed.set(&account, true);

        let args = runtime_args! {
            "recipient" => account,
            "amount" => claimable_total
        };
        let call_def = CallDef::new("transfer", true, args);
        let success: bool = self.env().call_contract(reward_asset, call_def);
        if !success {
            self.env().revert(CreditError::ExternalCallFailed);
        }

        claimable_total
    }

    /// Recorded claimable total for an account
    pub fn get_claimable(&self, account: Address) -> U256 {
        self.claimable.get(&account).unwrap_or(U256::zero())
    }

    /// Check whether an account's claim was spent
    pub fn is_claimed(&self, account: Address) -> bool {
        self.claimed.get(&account).unwrap_or(false)
    }

    // ========== Internal Functions ==========

    fn require_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get();
        match admin {
            Some(adm) if caller == adm => {}
            _ => self.env().revert(CreditError::Unauthorized),
        }
    }
}
