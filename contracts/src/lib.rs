//! CSPR-PayLater Contracts
//!
//! Collateral-backed "buy now, pay later" credit ledger for Casper.
//!
//! ## Architecture
//!
//! - **CollateralLedger**: per-(user, asset) staked/locked balances, reward
//!   accrual and available-credit computation
//! - **DebtLedger**: credit extension lifecycle (create/repay/liquidate),
//!   fees, deadlines, penalty split and fee custody
//! - **YieldStrategy**: adapter over one external shares-based yield vault
//!   plus a proof-authenticated reward distributor; APY estimation from a
//!   share-price snapshot ring
//! - **AssetToken**: CEP-18 compatible payment/collateral token
//! - **MockYieldVault / MockRewardDistributor**: venue stand-ins for tests
//!   and demo deployments
//!
//! ## Trust topology
//!
//! The CollateralLedger accepts lock/unlock/liquidate calls only from the
//! one registered DebtLedger address; the YieldStrategy moves funds only
//! for its authorized callers (the CollateralLedger). Both references are
//! re-pointable through admin setters.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod interfaces;
pub mod rewards;
pub mod apy;

// Contract modules
pub mod collateral_ledger;
pub mod debt_ledger;
pub mod yield_strategy;
pub mod asset_token;
pub mod mock_venue;
