//! Protocol Constants
//!
//! All magic numbers and configuration values for the LedgerSwap engine.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (longer oracle validity window)
//! - Default (no feature) - Testnet values
//!
//! ```toml
//! # For mainnet deployment:
//! ledgerswap-common = { path = "...", features = ["mainnet"] }
//! ```

/// Fee Configuration (in basis points, 100 = 1%)
pub mod fees {
    /// Basis points denominator
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Swap fee applied to every new pool (0.30%)
    pub const DEFAULT_POOL_FEE_BPS: u64 = 30;

    /// Highest fee rate a pool may be configured with (10%)
    pub const MAX_POOL_FEE_BPS: u64 = 1_000;
}

/// Pool Configuration
pub mod pool {
    /// LP shares minted to the creator of a pool, independent of deposit size
    pub const INITIAL_LP_SUPPLY: u64 = 1_000_000;

    /// First pool id handed out
    pub const FIRST_POOL_ID: u64 = 1;
}

/// Swap Configuration
pub mod swap {
    /// Maximum share of the input reserve one trade may consume (2%)
    pub const MAX_PRICE_IMPACT_BPS: u64 = 200;

    /// Maximum number of hops in a routed swap
    pub const MAX_HOPS: usize = 10;
}

/// Flash Loan Configuration
pub mod flash {
    /// Flash loan fee (0.10%), seeds the protocol fee rate scalar
    pub const FLASH_LOAN_FEE_BPS: u64 = 10;

    /// Loans are due one height after issuance
    pub const LOAN_DURATION_HEIGHTS: u64 = 1;

    /// First loan id handed out
    pub const FIRST_LOAN_ID: u64 = 1;
}

/// Yield Farm Configuration
pub mod farm {
    /// Scale factor for accumulated reward per share (1e18)
    pub const REWARD_MULTIPLIER: u128 = 1_000_000_000_000_000_000;
}

/// Governance Configuration
pub mod governance {
    /// Lock heights that earn one extra unit of voting power per staked unit
    pub const LOCK_BONUS_PERIOD: u64 = 1_000;
}

/// Oracle Configuration
pub mod oracle {
    /// Price precision (8 decimals)
    pub const PRICE_PRECISION: u128 = 100_000_000;

    /// Heights the moving TWAP averages over
    pub const TWAP_WINDOW_HEIGHTS: u64 = 144;

    /// Maximum heights since last pool update before the TWAP is stale
    /// - Mainnet: ~1 day at 10 min heights
    /// - Testnet: shorter window so staleness is easy to exercise
    #[cfg(feature = "mainnet")]
    pub const MAX_TWAP_AGE: u64 = 144;
    #[cfg(not(feature = "mainnet"))]
    pub const MAX_TWAP_AGE: u64 = 36;
}

/// Precision constants
pub mod precision {
    /// Scale for per-share fee growth (1e18)
    pub const FEE_GROWTH_SCALE: u128 = 1_000_000_000_000_000_000;
}
