//! Protocol error definitions.

use odra::prelude::*;

/// Pay-later protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CreditError {
    // Collateral ledger errors (1xx)
    UnsupportedAsset = 100,
    InvalidAmount = 101,
    InsufficientFreeBalance = 102,
    InsufficientLockedBalance = 103,

    // Debt ledger errors (2xx)
    InsufficientCredit = 200,
    PeriodOutOfRange = 201,
    AlreadySettled = 202,
    DeadlineNotReached = 203,
    DebtNotFound = 204,
    InsufficientLiquidity = 205,

    // Yield strategy errors (3xx)
    StrategyNotConfigured = 300,

    // Access control errors (4xx)
    Unauthorized = 400,

    // Token / external call errors (5xx)
    ExternalCallFailed = 500,
    InsufficientTokenBalance = 501,

    // Configuration errors (9xx)
    InvalidConfig = 900,
    ReentrantCall = 901,
}

impl CreditError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Collateral ledger
            CreditError::UnsupportedAsset => "Asset is not supported for staking",
            CreditError::InvalidAmount => "Amount is zero or exceeds available balance",
            CreditError::InsufficientFreeBalance => "Amount exceeds free (unlocked) balance",
            CreditError::InsufficientLockedBalance => "Amount exceeds locked collateral",

            // Debt ledger
            CreditError::InsufficientCredit => "Available credit below payment amount",
            CreditError::PeriodOutOfRange => "Repayment period outside allowed bounds",
            CreditError::AlreadySettled => "Debt is not in open state",
            CreditError::DeadlineNotReached => "Repayment deadline has not passed",
            CreditError::DebtNotFound => "Debt not found",
            CreditError::InsufficientLiquidity => "Ledger liquidity cannot cover payout",

            // Yield strategy
            CreditError::StrategyNotConfigured => "Yield strategy not configured",

            // Access control
            CreditError::Unauthorized => "Unauthorized: caller lacks required identity",

            // Token / external
            CreditError::ExternalCallFailed => "External transfer or vault call failed",
            CreditError::InsufficientTokenBalance => "Insufficient token balance",

            // Config
            CreditError::InvalidConfig => "Invalid configuration parameter",
            CreditError::ReentrantCall => "Reentrant call into entry point",
        }
    }
}

impl core::fmt::Display for CreditError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<CreditError> for OdraError {
    fn from(error: CreditError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
