//! Error Types for LedgerSwap
//!
//! Every failure is typed and aborts the whole operation. Variants carry the
//! values that caused them so callers can decide whether to resubmit.

use crate::types::{Address, LoanId, PoolId};

/// Result type alias for engine operations
pub type AmmResult<T> = Result<T, AmmError>;

/// Main error enum for all LedgerSwap errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmmError {
    // ============ Authorization Errors ============
    /// Caller is not the owner or the borrower
    NotAuthorized { expected: Address, actual: Address },

    /// Protocol is in emergency shutdown
    ProtocolPaused,

    // ============ Pool Errors ============
    /// Pool not found with given ID
    PoolNotFound { pool_id: PoolId },

    /// Identical tokens, or a token that does not belong to the pool
    InvalidPair,

    /// Zero reserve, zero deposit, or a withdrawal that would empty the pool
    ZeroLiquidity,

    /// Pool cannot cover the requested amount
    InsufficientLiquidity { available: u64, requested: u64 },

    // ============ Swap Errors ============
    /// Trade consumes too large a share of the input reserve
    PriceImpactHigh { impact_bps: u64, max_bps: u64 },

    /// Swap output below the caller's minimum
    SlippageExceeded { minimum: u64, actual: u64 },

    /// Minted shares or withdrawn tokens below the caller's minimum
    MinTokensNotMet { minimum: u64, actual: u64 },

    /// Trade is too small to produce any output
    ZeroOutput,

    /// Routed swap path is empty, too long, or disconnected
    InvalidPath { reason: &'static str },

    // ============ Flash Loan Errors ============
    /// Loan past its due height
    Expired { due_height: u64, current_height: u64 },

    /// Callback did not repay principal plus fee
    FlashLoanFailed { required: u64, repaid: u64 },

    /// Loan not found with given ID
    LoanNotFound { loan_id: LoanId },

    /// Loan already verified
    LoanNotActive { loan_id: LoanId },

    // ============ Oracle Errors ============
    /// TWAP read past its validity window
    OracleStale {
        last_update_height: u64,
        current_height: u64,
        max_age: u64,
    },

    // ============ Farm Errors ============
    /// No farm registered for the pool
    FarmNotFound { pool_id: PoolId },

    /// Pool already has a farm
    FarmAlreadyExists { pool_id: PoolId },

    // ============ Governance Errors ============
    /// Governance token has not been registered
    GovernanceTokenNotSet,

    /// Account has no governance stake
    StakeNotFound { staker: Address },

    // ============ Amount Errors ============
    /// Zero amount not allowed
    ZeroAmount,

    /// Insufficient balance for operation
    InsufficientBalance { available: u64, requested: u64 },

    /// Token transfer failed
    TransferFailed { from: Address, to: Address, amount: u64 },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,

    // ============ Input / State Errors ============
    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },

    /// Stored record could not be decoded
    StateCorrupted { table: &'static str },

    /// Logical clock may only move forward
    HeightRegression { current: u64, requested: u64 },

    /// Logical clock cannot move while an operation is in progress
    HeightLocked { height: u64 },
}

impl AmmError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthorized { .. } => "E001_NOT_AUTHORIZED",
            Self::ProtocolPaused => "E002_PAUSED",
            Self::PoolNotFound { .. } => "E010_POOL_NOT_FOUND",
            Self::InvalidPair => "E011_INVALID_PAIR",
            Self::ZeroLiquidity => "E012_ZERO_LIQUIDITY",
            Self::InsufficientLiquidity { .. } => "E013_INSUFFICIENT_LIQUIDITY",
            Self::PriceImpactHigh { .. } => "E020_PRICE_IMPACT_HIGH",
            Self::SlippageExceeded { .. } => "E021_SLIPPAGE_EXCEEDED",
            Self::MinTokensNotMet { .. } => "E022_MIN_TOKENS_NOT_MET",
            Self::ZeroOutput => "E023_ZERO_OUTPUT",
            Self::InvalidPath { .. } => "E024_INVALID_PATH",
            Self::Expired { .. } => "E030_EXPIRED",
            Self::FlashLoanFailed { .. } => "E031_FLASH_LOAN_FAILED",
            Self::LoanNotFound { .. } => "E032_LOAN_NOT_FOUND",
            Self::LoanNotActive { .. } => "E033_LOAN_NOT_ACTIVE",
            Self::OracleStale { .. } => "E040_ORACLE_STALE",
            Self::FarmNotFound { .. } => "E050_FARM_NOT_FOUND",
            Self::FarmAlreadyExists { .. } => "E051_FARM_EXISTS",
            Self::GovernanceTokenNotSet => "E060_GOV_TOKEN_NOT_SET",
            Self::StakeNotFound { .. } => "E061_STAKE_NOT_FOUND",
            Self::ZeroAmount => "E070_ZERO_AMOUNT",
            Self::InsufficientBalance { .. } => "E071_INSUFFICIENT_BALANCE",
            Self::TransferFailed { .. } => "E072_TRANSFER_FAILED",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::InvalidInput { .. } => "E090_INVALID_INPUT",
            Self::StateCorrupted { .. } => "E091_STATE_CORRUPTED",
            Self::HeightRegression { .. } => "E092_HEIGHT_REGRESSION",
            Self::HeightLocked { .. } => "E093_HEIGHT_LOCKED",
        }
    }

    /// Returns true if this error is recoverable (user can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::SlippageExceeded { .. } => true,     // Loosen the bound
            Self::PriceImpactHigh { .. } => true,      // Split the trade
            Self::InsufficientBalance { .. } => true,  // Get more funds
            Self::OracleStale { .. } => true,          // Wait for a trade
            _ => false,
        }
    }
}
