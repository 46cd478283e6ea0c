//! LedgerSwap Engine - Constant-Product AMM State Machine
//!
//! The engine orchestrates every public operation of the protocol as one
//! atomic transition over the shared versioned store.
//!
//! ## Core Operations
//!
//! - **Pools**: create constant-product pools, add and remove liquidity
//! - **Swaps**: exact-input single-hop swaps and multi-hop routes
//! - **Flash Loans**: borrow reserves for the span of a callback
//! - **Yield Farms**: stake LP shares for a per-height reward stream
//! - **Governance**: time-locked staking for voting power and delegation
//!
//! ## Execution Model
//!
//! Every operation opens a store transaction, performs its reads, checks and
//! writes, and either commits or rolls back as a whole. Token transfers go
//! through the [`TokenLedger`] collaborator and join the same transaction, so a
//! failure anywhere leaves no visible effect.
//!
//! Operations may nest: a flash-loan callback receives `&mut Engine` and can
//! swap, add liquidity or borrow again. Each nested call is atomic on its own
//! and is still undone if the outer loan fails.
//!
//! The block height is a logical clock supplied by the host through
//! [`Engine::advance_height`]. It cannot move while an operation is running,
//! so flash-loan callbacks see the same height as the call that issued them.

pub mod admin;
pub mod config;
pub mod farm;
pub mod flash;
pub mod governance;
pub mod liquidity;
pub mod pools;
pub mod swap;


pub use config::EngineConfig;
pub use flash::{FlashBorrower, FlashLoanContext};
pub use swap::SwapOutcome;

use ledgerswap_common::{
    constants::flash::FLASH_LOAN_FEE_BPS,
    errors::{AmmError, AmmResult},
    events::{AmmEvent, EventLog},
    store::{ScalarKey, Store, StoreKey},
    token_ops::{StoreTokenLedger, TokenLedger},
    types::{Address, TokenId},
};

// ============ Engine ============

/// The AMM state machine
#[derive(Debug)]
pub struct Engine<L: TokenLedger = StoreTokenLedger> {
    store: Store,
    tokens: L,
    config: EngineConfig,
    height: u64,
}

impl<L: TokenLedger> Engine<L> {
    /// Create an engine over an empty store
    pub fn new(config: EngineConfig, tokens: L) -> AmmResult<Self> {
        Self::with_store(config, tokens, Store::new())
    }

    /// Create an engine over an existing store, initialising missing scalars
    pub fn with_store(config: EngineConfig, tokens: L, mut store: Store) -> AmmResult<Self> {
        config.validate()?;

        let fee_key = StoreKey::Scalar(ScalarKey::ProtocolFeeRate);
        if store.get::<u64>(&fee_key)?.is_none() {
            store.put(&fee_key, &FLASH_LOAN_FEE_BPS)?;
        }

        Ok(Self {
            store,
            tokens,
            config,
            height: 0,
        })
    }

    // ============ Clock ============

    /// Current logical block height
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Move the logical clock forward
    ///
    /// Only the host may do this, between operations.
    pub fn advance_height(&mut self, height: u64) -> AmmResult<()> {
        if self.store.in_transaction() {
            return Err(AmmError::HeightLocked { height: self.height });
        }
        if height < self.height {
            return Err(AmmError::HeightRegression {
                current: self.height,
                requested: height,
            });
        }
        self.height = height;
        Ok(())
    }

    // ============ Accessors ============

    /// Configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only view of the backing store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Token collaborator
    pub fn tokens(&self) -> &L {
        &self.tokens
    }

    /// Events committed so far
    pub fn events(&self) -> &EventLog {
        self.store.events()
    }

    /// Hand committed events to an indexer
    pub fn drain_events(&mut self) -> Vec<AmmEvent> {
        self.store.drain_events()
    }

    /// Balance of `account` in `token`, as reported by the token collaborator
    pub fn balance_of(&self, token: &TokenId, account: &Address) -> AmmResult<u64> {
        self.tokens.balance_of(&self.store, token, account)
    }

    // ============ Internal Helpers ============

    /// Run `op` as one atomic store transition
    pub(crate) fn atomic<R>(&mut self, op: impl FnOnce(&mut Self) -> AmmResult<R>) -> AmmResult<R> {
        let height = self.height;
        self.store.begin();
        match op(self) {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.store.rollback()?;
                self.height = height;
                Err(err)
            }
        }
    }

    /// Reject user operations while emergency shutdown is on
    pub(crate) fn ensure_active(&self) -> AmmResult<()> {
        if self.store.flag(ScalarKey::EmergencyShutdown)? {
            return Err(AmmError::ProtocolPaused);
        }
        Ok(())
    }

    pub(crate) fn ensure_owner(&self, caller: &Address) -> AmmResult<()> {
        if *caller != self.config.owner {
            return Err(AmmError::NotAuthorized {
                expected: self.config.owner,
                actual: *caller,
            });
        }
        Ok(())
    }

    /// Move tokens through the collaborator; zero amounts are a no-op
    pub(crate) fn transfer(
        &mut self,
        token: &TokenId,
        amount: u64,
        from: &Address,
        to: &Address,
    ) -> AmmResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.tokens.transfer(&mut self.store, token, amount, from, to, None)
    }

    /// Read a counter and bump it
    pub(crate) fn next_id(&mut self, key: ScalarKey, first: u64) -> AmmResult<u64> {
        let id = self.store.scalar_u64(key, first)?;
        let next = id.checked_add(1).ok_or(AmmError::Overflow)?;
        self.store.put(&StoreKey::Scalar(key), &next)?;
        Ok(id)
    }

    /// Credit collected fees to the protocol treasury accumulator
    pub(crate) fn credit_treasury(&mut self, fee: u64) -> AmmResult<()> {
        if fee == 0 {
            return Ok(());
        }
        let total = self.store.scalar_u64(ScalarKey::TotalFeesCollected, 0)?;
        let total = total.checked_add(fee).ok_or(AmmError::Overflow)?;
        self.store.put(&StoreKey::Scalar(ScalarKey::TotalFeesCollected), &total)
    }

    pub(crate) fn emit(&mut self, event: AmmEvent) {
        self.store.emit(event);
    }
}

impl Engine<StoreTokenLedger> {
    /// Engine with the store-backed token ledger
    pub fn with_store_ledger(config: EngineConfig) -> AmmResult<Self> {
        Self::new(config, StoreTokenLedger::new())
    }

    /// Genesis funding through the store-backed ledger
    pub fn mint(&mut self, token: &TokenId, to: &Address, amount: u64) -> AmmResult<()> {
        self.tokens.mint(&mut self.store, token, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        [1u8; 32]
    }

    fn engine() -> Engine {
        Engine::with_store_ledger(EngineConfig::new(owner())).unwrap()
    }

    #[test]
    fn test_new_engine_initialises_protocol_fee() {
        let engine = engine();
        assert_eq!(engine.protocol_fee_rate().unwrap(), FLASH_LOAN_FEE_BPS);
        assert_eq!(engine.height(), 0);
        assert!(!engine.is_shutdown().unwrap());
    }

    #[test]
    fn test_existing_fee_rate_kept() {
        let mut store = Store::new();
        store.put(&StoreKey::Scalar(ScalarKey::ProtocolFeeRate), &25u64).unwrap();
        let engine = Engine::with_store(EngineConfig::new(owner()), StoreTokenLedger, store).unwrap();
        assert_eq!(engine.protocol_fee_rate().unwrap(), 25);
    }

    #[test]
    fn test_height_cannot_regress() {
        let mut engine = engine();
        engine.advance_height(10).unwrap();
        engine.advance_height(10).unwrap();
        assert_eq!(
            engine.advance_height(9),
            Err(AmmError::HeightRegression { current: 10, requested: 9 })
        );
        assert_eq!(engine.height(), 10);
    }

    #[test]
    fn test_atomic_rolls_back_on_error() {
        let mut engine = engine();
        let token = [9u8; 32];
        engine.mint(&token, &owner(), 100).unwrap();

        let result: AmmResult<()> = engine.atomic(|e| {
            e.transfer(&token, 60, &owner(), &[2u8; 32])?;
            Err(AmmError::ZeroOutput)
        });

        assert_eq!(result, Err(AmmError::ZeroOutput));
        assert_eq!(engine.balance_of(&token, &owner()).unwrap(), 100);
        assert_eq!(engine.store().depth(), 0);
    }

    #[test]
    fn test_clock_locked_inside_operation() {
        let mut engine = engine();
        engine.advance_height(10).unwrap();

        let result: AmmResult<()> = engine.atomic(|e| e.advance_height(20));
        assert_eq!(result, Err(AmmError::HeightLocked { height: 10 }));
        assert_eq!(engine.height(), 10);

        engine.advance_height(20).unwrap();
        assert_eq!(engine.height(), 20);
    }

    #[test]
    fn test_rollback_restores_height() {
        let mut engine = engine();
        engine.advance_height(10).unwrap();

        let result: AmmResult<()> = engine.atomic(|e| {
            e.height = 500;
            Err(AmmError::ZeroOutput)
        });
        assert_eq!(result, Err(AmmError::ZeroOutput));
        assert_eq!(engine.height(), 10);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::new(owner());
        config.max_hops = 0;
        assert!(Engine::with_store_ledger(config).is_err());
    }
}
