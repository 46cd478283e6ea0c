//! Token Operations Module
//!
//! The transfer capability the engine needs from token contracts.
//!
//! Transfers take the store so they join the caller's transaction: a token
//! movement inside an aborted operation is undone with everything else.
//!
//! ## Key Features
//!
//! - **Atomic transfers**: a transfer either moves the full amount or fails
//! - **Conservation**: transfers never change total supply
//! - **Store-backed ledger**: reference implementation for hosts and tests

use crate::errors::{AmmError, AmmResult};
use crate::store::{Store, StoreKey};
use crate::types::{Address, TokenId};

/// Token contract interface consumed by the engine
pub trait TokenLedger {
    /// Move `amount` of `token` from `from` to `to`. Must fail without any
    /// effect if `from` lacks the balance.
    fn transfer(
        &self,
        store: &mut Store,
        token: &TokenId,
        amount: u64,
        from: &Address,
        to: &Address,
        memo: Option<&[u8]>,
    ) -> AmmResult<()>;

    /// Balance of `account`, for external callers
    fn balance_of(&self, store: &Store, token: &TokenId, account: &Address) -> AmmResult<u64>;

    /// Total units of `token` in existence
    fn total_supply(&self, store: &Store, token: &TokenId) -> AmmResult<u64>;
}

/// Token ledger keeping balances in the engine store
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreTokenLedger;

impl StoreTokenLedger {
    pub fn new() -> Self {
        Self
    }

    /// Create `amount` new units for `to` (genesis and test funding)
    pub fn mint(&self, store: &mut Store, token: &TokenId, to: &Address, amount: u64) -> AmmResult<()> {
        if amount == 0 {
            return Err(AmmError::ZeroAmount);
        }

        let supply = self.total_supply(store, token)?;
        let new_supply = supply.checked_add(amount).ok_or(AmmError::Overflow)?;
        let balance = self.balance_of(store, token, to)?;
        let new_balance = balance.checked_add(amount).ok_or(AmmError::Overflow)?;

        store.put(&StoreKey::Supply(*token), &new_supply)?;
        store.put(&StoreKey::Balance(*token, *to), &new_balance)?;
        Ok(())
    }
}

impl TokenLedger for StoreTokenLedger {
    fn transfer(
        &self,
        store: &mut Store,
        token: &TokenId,
        amount: u64,
        from: &Address,
        to: &Address,
        _memo: Option<&[u8]>,
    ) -> AmmResult<()> {
        if amount == 0 {
            return Err(AmmError::ZeroAmount);
        }

        let from_balance = self.balance_of(store, token, from)?;
        if from_balance < amount {
            return Err(AmmError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }

        // Self-transfer is a balance check only
        if from == to {
            return Ok(());
        }

        let to_balance = self.balance_of(store, token, to)?;
        let new_to = to_balance.checked_add(amount).ok_or(AmmError::TransferFailed {
            from: *from,
            to: *to,
            amount,
        })?;

        store.put(&StoreKey::Balance(*token, *from), &(from_balance - amount))?;
        store.put(&StoreKey::Balance(*token, *to), &new_to)?;
        Ok(())
    }

    fn balance_of(&self, store: &Store, token: &TokenId, account: &Address) -> AmmResult<u64> {
        Ok(store.get::<u64>(&StoreKey::Balance(*token, *account))?.unwrap_or(0))
    }

    fn total_supply(&self, store: &Store, token: &TokenId) -> AmmResult<u64> {
        Ok(store.get::<u64>(&StoreKey::Supply(*token))?.unwrap_or(0))
    }
}
