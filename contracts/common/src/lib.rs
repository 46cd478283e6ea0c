//! LedgerSwap Common Library
//!
//! Shared types, constants, and utilities for the LedgerSwap AMM engine.
//!
//! Everything here is deterministic and ledger-agnostic:
//! - **Records**: pools, liquidity positions, flash loans, yield farms and
//!   governance stakes, all borsh-encoded into a single versioned store
//! - **Math**: constant-product pricing, LP share math, reward accrual,
//!   voting power and TWAP folding, all integer (floor) arithmetic
//! - **Store**: ordered key-value map with nested, journaled transactions
//! - **Token interface**: the transfer capability the engine consumes
//! - **Events**: a journaled protocol event log for indexers
//!
//! This crate is `no_std` compatible when built without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::vec::Vec;
#[cfg(feature = "std")]
pub use std::vec::Vec;

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod farm;
pub mod governance;
pub mod oracle;
pub mod events;
pub mod store;
pub mod token_ops;

// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use store::{ScalarKey, Store, StoreKey, Table};
pub use token_ops::{StoreTokenLedger, TokenLedger};
