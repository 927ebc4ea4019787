//! External interfaces consumed by the pay-later protocol.
//!
//! The protocol treats the token standard, the yield venue and the reward
//! distributor as external collaborators. These traits document the wire
//! contract; modules issue the calls through `CallDef` with matching entry
//! point names and arguments.

use odra::prelude::*;
use odra::casper_types::U256;

/// CEP-18 token interface for cross-contract calls.
///
/// The atomic asset transfer primitive: a failed transfer reverts the whole
/// calling entry point.
#[odra::external_contract]
pub trait Cep18Token {
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool;
    fn approve(&mut self, spender: Address, amount: U256) -> bool;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn balance_of(&self, account: Address) -> U256;
    fn total_supply(&self) -> U256;
}

/// Shares-based yield venue consumed by the strategy adapter.
///
/// Deposits mint shares at the venue's current exchange rate; redemptions
/// burn shares for assets at the same live rate.
#[odra::external_contract]
pub trait YieldVault {
    fn deposit_assets(&mut self, amount: U256) -> U256;
    fn redeem_shares(&mut self, shares: U256) -> U256;
    fn convert_to_shares(&self, assets: U256) -> U256;
    fn convert_to_assets(&self, shares: U256) -> U256;
    fn total_shares(&self) -> U256;
    fn balance_of(&self, account: Address) -> U256;
}

/// Proof-authenticated reward distributor.
///
/// `claimable_total` is computed off-ledger; the proof merely authenticates
/// it at claim time. Returns the amount actually paid out.
#[odra::external_contract]
pub trait RewardDistributor {
    fn claim(
        &mut self,
        account: Address,
        reward_asset: Address,
        claimable_total: U256,
        proof: Vec<u8>,
    ) -> U256;
}
