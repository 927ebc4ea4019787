//! Debt Ledger Contract
//!
//! Opens, repays and liquidates pay-later credit extensions against
//! collateral locked in the CollateralLedger.
//!
//! ## Lifecycle
//!
//! `Open -> Repaid` or `Open -> Liquidated`; both terminal.
//!
//! ## Funding model
//!
//! Merchant payouts for `create_debt` are drawn from the ledger's own
//! liquidity (funded via `deposit_liquidity`, replenished by repayments).
//! `create_debt_for` draws from the calling integrator's funds instead.
//! Platform fees and liquidation residue accumulate on the ledger and leave
//! only through the explicit admin `withdraw_fees`.

use odra::prelude::*;
use odra::casper_types::{runtime_args, U256};
use odra::CallDef;

use crate::errors::CreditError;
use crate::types::{CreditTerms, DebtData, DebtState, BPS_SCALE};

// Entry-point guard ids
const ENTRY_CREATE: u8 = 0;
const ENTRY_CREATE_FOR: u8 = 1;
const ENTRY_REPAY: u8 = 2;
const ENTRY_LIQUIDATE: u8 = 3;
const ENTRY_DEPOSIT_LIQUIDITY: u8 = 4;
const ENTRY_WITHDRAW_FEES: u8 = 5;
const ENTRY_WITHDRAW_LIQUIDITY: u8 = 6;

/// Debt Ledger Contract
#[odra::module]
pub struct DebtLedger {
    /// Protocol admin address
    admin: Var<Address>,
    /// CollateralLedger address (sole counterparty for collateral moves)
    collateral_ledger: Var<Option<Address>>,
    /// Next debt id (starts at 1)
    next_debt_id: Var<u64>,
    /// Debt storage: debt_id -> record
    debts: Mapping<u64, DebtData>,
    /// Per-user debt history: (user, index) -> debt_id
    user_debts: Mapping<(Address, u32), u64>,
    /// Per-user debt count
    user_debt_count: Mapping<Address, u32>,
    /// Credit terms applied to new debts
    terms: Var<CreditTerms>,
    /// Integrators allowed to call `create_debt_for`
    integrators: Mapping<Address, bool>,
    /// Lending float per payment asset
    liquidity: Mapping<Address, U256>,
    /// Withdrawable protocol fees and liquidation residue per asset
    protocol_fees: Mapping<Address, U256>,
    /// Per-entry-point reentrancy flags
    entry_guards: Mapping<u8, bool>,
}

#[odra::module]
impl DebtLedger {
    /// Initialize the ledger
    pub fn init(
        &mut self,
        admin: Address,
        collateral_ledger: Address,
        fee_bps: u32,
        penalty_bps: u32,
        min_period: u64,
        max_period: u64,
    ) {
        if fee_bps as u64 > BPS_SCALE || penalty_bps as u64 > BPS_SCALE {
            self.env().revert(CreditError::InvalidConfig);
        }
        if min_period > max_period || max_period == 0 {
            self.env().revert(CreditError::InvalidConfig);
        }

        self.admin.set(admin);
        self.collateral_ledger.set(Some(collateral_ledger));
        self.next_debt_id.set(1);
        self.terms.set(CreditTerms {
            fee_bps,
            penalty_bps,
            min_period,
            max_period,
        });
    }

    // ========== Debt Creation ==========

    /// Extend credit to the caller for a merchant payment.
    ///
    /// Locks `payment_amount * collateral_ratio / 10000` of the caller's
    /// free collateral and pays the merchant `payment_amount - fee` from the
    /// ledger's liquidity.
    ///
    /// # Returns
    /// * The new debt id
    pub fn create_debt(
        &mut self,
        merchant: Address,
        payment_asset: Address,
        payment_amount: U256,
        collateral_asset: Address,
        repayment_period: u64,
    ) -> u64 {
        self.enter(ENTRY_CREATE);
        let borrower = self.env().caller();

        let (debt_id, fee) = self.open_debt(
            borrower,
            merchant,
            payment_asset,
            payment_amount,
            collateral_asset,
            repayment_period,
        );

        // Pay the merchant from the ledger's own liquidity; the fee portion
        // is earmarked as withdrawable protocol revenue.
        let available = self.liquidity.get(&payment_asset).unwrap_or(U256::zero());
        if available < payment_amount {
            self.env().revert(CreditError::InsufficientLiquidity);
        }
        self.liquidity.set(&payment_asset, available - payment_amount);
        self.add_fee(payment_asset, fee);

        let payout = payment_amount - fee;
        self.token_transfer(payment_asset, merchant, payout);

        self.exit(ENTRY_CREATE);
        debt_id
    }

    /// Extend credit on behalf of `borrower`; integrator allow-list only.
    ///
    /// Performs the identical validation and locking sequence, but the
    /// merchant payout and the fee are pulled from the integrator's funds
    /// rather than the ledger's liquidity.
    pub fn create_debt_for(
        &mut self,
        borrower: Address,
        merchant: Address,
        payment_asset: Address,
        payment_amount: U256,
        collateral_asset: Address,
        repayment_period: u64,
    ) -> u64 {
        self.enter(ENTRY_CREATE_FOR);

        let integrator = self.env().caller();
        if !self.is_integrator(integrator) {
            self.env().revert(CreditError::Unauthorized);
        }

        let (debt_id, fee) = self.open_debt(
            borrower,
            merchant,
            payment_asset,
            payment_amount,
            collateral_asset,
            repayment_period,
        );

        let payout = payment_amount - fee;
        let self_address = self.env().self_address();
        self.token_transfer_from(payment_asset, integrator, merchant, payout);
        if !fee.is_zero() {
            self.token_transfer_from(payment_asset, integrator, self_address, fee);
        }
        self.add_fee(payment_asset, fee);

        self.exit(ENTRY_CREATE_FOR);
        debt_id
    }

    // ========== Settlement ==========

    /// Repay an open debt. Borrower only.
    ///
    /// Past the deadline the penalty is added to the amount pulled from the
    /// borrower; the unlocked collateral is always the original amount.
    pub fn repay(&mut self, debt_id: u64) {
        self.enter(ENTRY_REPAY);

        let mut debt = match self.debts.get(&debt_id) {
            Some(d) => d,
            None => self.env().revert(CreditError::DebtNotFound),
        };

        let caller = self.env().caller();
        if caller != debt.borrower {
            self.env().revert(CreditError::Unauthorized);
        }
        if !debt.is_open() {
            self.env().revert(CreditError::AlreadySettled);
        }

        let now = self.env().get_block_time();
        let penalty = if now > debt.deadline {
            debt.payment_amount * U256::from(debt.penalty_bps) / U256::from(BPS_SCALE)
        } else {
            U256::zero()
        };

        let total = debt.payment_amount + penalty;
        let self_address = self.env().self_address();
        self.token_transfer_from(debt.payment_asset, caller, self_address, total);

        // The principal replenishes the lending float; a late penalty is
        // protocol revenue.
        let available = self.liquidity.get(&debt.payment_asset).unwrap_or(U256::zero());
        self.liquidity.set(&debt.payment_asset, available + debt.payment_amount);
        self.add_fee(debt.payment_asset, penalty);

        self.unlock_collateral(debt.borrower, debt.collateral_asset, debt.collateral_amount);

        debt.state = DebtState::Repaid;
        self.debts.set(&debt_id, debt);

        self.exit(ENTRY_REPAY);
    }

    /// Liquidate an overdue debt. Callable by anyone once the deadline has
    /// passed.
    ///
    /// The full locked collateral is seized to this ledger. The penalty
    /// (computed on the payment amount) is split 50/50 between the merchant
    /// and the protocol; the merchant's share is paid out of the seized
    /// collateral, everything else stays custodied until an explicit admin
    /// fee withdrawal.
    pub fn liquidate(&mut self, debt_id: u64) {
        self.enter(ENTRY_LIQUIDATE);

        let mut debt = match self.debts.get(&debt_id) {
            Some(d) => d,
            None => self.env().revert(CreditError::DebtNotFound),
        };

        if !debt.is_open() {
            self.env().revert(CreditError::AlreadySettled);
        }

        let now = self.env().get_block_time();
        if now <= debt.deadline {
            self.env().revert(CreditError::DeadlineNotReached);
        }

        let penalty = debt.payment_amount * U256::from(debt.penalty_bps) / U256::from(BPS_SCALE);
        // Merchant gets the rounded-down half; the odd unit stays with the
        // protocol. The share is bounded by the seized amount.
        let merchant_share = core::cmp::min(penalty / U256::from(2u64), debt.collateral_amount);

        // Pull the collateral out of the staking ledger into custody here
        let self_address = self.env().self_address();
        self.seize_collateral(
            debt.borrower,
            debt.collateral_asset,
            debt.collateral_amount,
            self_address,
        );

        if !merchant_share.is_zero() {
            self.token_transfer(debt.collateral_asset, debt.merchant, merchant_share);
        }
        self.add_fee(debt.collateral_asset, debt.collateral_amount - merchant_share);

        debt.state = DebtState::Liquidated;
        self.debts.set(&debt_id, debt);

        self.exit(ENTRY_LIQUIDATE);
    }

    // ========== Liquidity & Fee Custody ==========

    /// Fund the lending float for a payment asset. Open to anyone.
    pub fn deposit_liquidity(&mut self, asset: Address, amount: U256) {
        self.enter(ENTRY_DEPOSIT_LIQUIDITY);

        if amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let caller = self.env().caller();
        let self_address = self.env().self_address();
        self.token_transfer_from(asset, caller, self_address, amount);

        let available = self.liquidity.get(&asset).unwrap_or(U256::zero());
        self.liquidity.set(&asset, available + amount);

        self.exit(ENTRY_DEPOSIT_LIQUIDITY);
    }

    /// Withdraw accumulated protocol fees and liquidation residue
    /// (admin only). The only path out for custodied funds.
    pub fn withdraw_fees(&mut self, asset: Address, amount: U256, recipient: Address) {
        self.enter(ENTRY_WITHDRAW_FEES);
        self.require_admin();

        let fees = self.protocol_fees.get(&asset).unwrap_or(U256::zero());
        if amount.is_zero() || amount > fees {
            self.env().revert(CreditError::InvalidAmount);
        }

        self.protocol_fees.set(&asset, fees - amount);
        self.token_transfer(asset, recipient, amount);

        self.exit(ENTRY_WITHDRAW_FEES);
    }

    /// Withdraw lending float (admin only)
    pub fn withdraw_liquidity(&mut self, asset: Address, amount: U256, recipient: Address) {
        self.enter(ENTRY_WITHDRAW_LIQUIDITY);
        self.require_admin();

        let available = self.liquidity.get(&asset).unwrap_or(U256::zero());
        if amount.is_zero() || amount > available {
            self.env().revert(CreditError::InvalidAmount);
        }

        self.liquidity.set(&asset, available - amount);
        self.token_transfer(asset, recipient, amount);

        self.exit(ENTRY_WITHDRAW_LIQUIDITY);
    }

    // ========== Views ==========

    /// Get a debt record
    pub fn get_debt(&self, debt_id: u64) -> Option<DebtData> {
        self.debts.get(&debt_id)
    }

    /// All open debt ids for a user, in ascending (creation) order
    pub fn get_user_active_debts(&self, user: Address) -> Vec<u64> {
        let count = self.user_debt_count.get(&user).unwrap_or(0);
        let mut active = Vec::new();

        for index in 0..count {
            if let Some(debt_id) = self.user_debts.get(&(user, index)) {
                if let Some(debt) = self.debts.get(&debt_id) {
                    if debt.is_open() {
                        active.push(debt_id);
                    }
                }
            }
        }

        active
    }

    /// Number of debts ever created for a user
    pub fn get_user_debt_count(&self, user: Address) -> u32 {
        self.user_debt_count.get(&user).unwrap_or(0)
    }

    /// Debt id at a given index of a user's history (0-based)
    pub fn get_user_debt_id_at(&self, user: Address, index: u32) -> u64 {
        self.user_debts.get(&(user, index)).unwrap_or(0)
    }

    /// Current credit terms
    pub fn get_terms(&self) -> CreditTerms {
        self.terms.get().unwrap_or(CreditTerms {
            fee_bps: 0,
            penalty_bps: 0,
            min_period: 0,
            max_period: 0,
        })
    }

    /// Next debt id to be assigned
    pub fn get_next_debt_id(&self) -> u64 {
        self.next_debt_id.get().unwrap_or(1)
    }

    /// Lending float for an asset
    pub fn get_liquidity(&self, asset: Address) -> U256 {
        self.liquidity.get(&asset).unwrap_or(U256::zero())
    }

    /// Withdrawable fees for an asset
    pub fn get_protocol_fees(&self, asset: Address) -> U256 {
        self.protocol_fees.get(&asset).unwrap_or(U256::zero())
    }

    /// Check integrator allow-list membership
    pub fn is_integrator(&self, account: Address) -> bool {
        self.integrators.get(&account).unwrap_or(false)
    }

    /// CollateralLedger address
    pub fn get_collateral_ledger(&self) -> Option<Address> {
        self.collateral_ledger.get().flatten()
    }

    /// Admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get().unwrap_or_else(|| self.env().self_address())
    }

    // ========== Admin Functions ==========

    /// Set the platform fee in bps (admin only)
    pub fn set_platform_fee(&mut self, fee_bps: u32) {
        self.require_admin();
        if fee_bps as u64 > BPS_SCALE {
            self.env().revert(CreditError::InvalidConfig);
        }
        let mut terms = self.get_terms();
        terms.fee_bps = fee_bps;
        self.terms.set(terms);
    }

    /// Set the late/liquidation penalty in bps (admin only).
    ///
    /// Applies to debts created afterwards; each debt keeps the snapshot
    /// taken at its creation.
    pub fn set_penalty_rate(&mut self, penalty_bps: u32) {
        self.require_admin();
        if penalty_bps as u64 > BPS_SCALE {
            self.env().revert(CreditError::InvalidConfig);
        }
        let mut terms = self.get_terms();
        terms.penalty_bps = penalty_bps;
        self.terms.set(terms);
    }

    /// Set the inclusive repayment period bounds (admin only)
    pub fn set_repayment_period_bounds(&mut self, min_period: u64, max_period: u64) {
        self.require_admin();
        if min_period > max_period || max_period == 0 {
            self.env().revert(CreditError::InvalidConfig);
        }
        let mut terms = self.get_terms();
        terms.min_period = min_period;
        terms.max_period = max_period;
        self.terms.set(terms);
    }

    /// Re-point the CollateralLedger (admin only)
    pub fn set_collateral_ledger(&mut self, collateral_ledger: Address) {
        self.require_admin();
        self.collateral_ledger.set(Some(collateral_ledger));
    }

    /// Authorize an integrator for `create_debt_for` (admin only)
    pub fn add_integrator(&mut self, integrator: Address) {
        self.require_admin();
        self.integrators.set(&integrator, true);
    }

    /// Remove an integrator (admin only)
    pub fn remove_integrator(&mut self, integrator: Address) {
        self.require_admin();
        self.integrators.set(&integrator, false);
    }

    // ========== Internal Functions ==========

    /// Shared validation, collateral locking and record keeping for both
    /// creation paths. Returns the new debt id and the fee amount.
    fn open_debt(
        &mut self,
        borrower: Address,
        merchant: Address,
        payment_asset: Address,
        payment_amount: U256,
        collateral_asset: Address,
        repayment_period: u64,
    ) -> (u64, U256) {
        if payment_amount.is_zero() {
            self.env().revert(CreditError::InvalidAmount);
        }

        let terms = self.get_terms();
        if repayment_period < terms.min_period || repayment_period > terms.max_period {
            self.env().revert(CreditError::PeriodOutOfRange);
        }

        let ledger = self.require_collateral_ledger();

        let available_credit = self.get_available_credit(ledger, borrower, collateral_asset);
        if available_credit < payment_amount {
            self.env().revert(CreditError::InsufficientCredit);
        }

        // Collateral is fixed here and never recomputed, even if the ratio
        // changes for later debts.
        let ratio_bps = self.get_collateral_ratio_bps(ledger);
        let collateral_amount = payment_amount * U256::from(ratio_bps) / U256::from(BPS_SCALE);

        self.lock_collateral(borrower, collateral_asset, collateral_amount);

        let fee = payment_amount * U256::from(terms.fee_bps) / U256::from(BPS_SCALE);

        let debt_id = self.next_debt_id.get().unwrap_or(1);
        self.next_debt_id.set(debt_id + 1);

        let now = self.env().get_block_time();
        let debt = DebtData {
            debt_id,
            borrower,
            merchant,
            payment_asset,
            payment_amount,
            collateral_asset,
            collateral_amount,
            created_at: now,
            deadline: now + repayment_period,
            penalty_bps: terms.penalty_bps,
            state: DebtState::Open,
        };
        self.debts.set(&debt_id, debt);

        let count = self.user_debt_count.get(&borrower).unwrap_or(0);
        self.user_debts.set(&(borrower, count), debt_id);
        self.user_debt_count.set(&borrower, count + 1);

        (debt_id, fee)
    }

    fn add_fee(&mut self, asset: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let fees = self.protocol_fees.get(&asset).unwrap_or(U256::zero());
        self.protocol_fees.set(&asset, fees + amount);
    }

    fn require_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get();
        match admin {
            Some(adm) if caller == adm => {}
            _ => self.env().revert(CreditError::Unauthorized),
        }
    }

    fn require_collateral_ledger(&self) -> Address {
        match self.collateral_ledger.get().flatten() {
            Some(ledger) => ledger,
            None => self.env().revert(CreditError::InvalidConfig),
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

    fn get_available_credit(&self, ledger: Address, user: Address, asset: Address) -> U256 {
        let args = runtime_args! {
            "user" => user,
            "asset" => asset
        };
        let call_def = CallDef::new("get_available_credit", false, args);
        self.env().call_contract(ledger, call_def)
    }

    fn get_collateral_ratio_bps(&self, ledger: Address) -> u32 {
        let call_def = CallDef::new(
            "get_collateral_ratio_bps",
            false,
            odra::casper_types::RuntimeArgs::new(),
        );
        self.env().call_contract(ledger, call_def)
    }

    fn lock_collateral(&mut self, user: Address, asset: Address, amount: U256) {
        let ledger = self.require_collateral_ledger();
        let args = runtime_args! {
            "user" => user,
            "asset" => asset,
            "amount" => amount
        };
        let call_def = CallDef::new("lock_collateral", true, args);
        self.env().call_contract::<()>(ledger, call_def);
    }

    fn unlock_collateral(&mut self, user: Address, asset: Address, amount: U256) {
        let ledger = self.require_collateral_ledger();
        let args = runtime_args! {
            "user" => user,
            "asset" => asset,
            "amount" => amount
        };
        let call_def = CallDef::new("unlock_collateral", true, args);
        self.env().call_contract::<()>(ledger, call_def);
    }

    fn seize_collateral(&mut self, user: Address, asset: Address, amount: U256, recipient: Address) {
        let ledger = self.require_collateral_ledger();
        let args = runtime_args! {
            "user" => user,
            "asset" => asset,
            "amount" => amount,
            "recipient" => recipient
        };
        let call_def = CallDef::new("liquidate_collateral", true, args);
        self.env().call_contract::<()>(ledger, call_def);
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
}
