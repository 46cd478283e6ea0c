//! Pool creation and pool-level queries

use ledgerswap_common::{
    constants::pool::{FIRST_POOL_ID, INITIAL_LP_SUPPLY},
    errors::{AmmError, AmmResult},
    events::AmmEvent,
    math::{quote_exact_in, SwapQuote},
    oracle::{initialize_oracle, read_twap},
    store::{ScalarKey, StoreKey, Table},
    token_ops::TokenLedger,
    types::{
        custody_address, Address, CustodyDomain, LiquidityPosition, Pool, PoolId, PoolSide, SwapDirection, TokenId,
    },
};

use crate::Engine;

impl<L: TokenLedger> Engine<L> {
    /// Create a pool seeded with `initial_x` and `initial_y` from the caller
    ///
    /// The creator receives `INITIAL_LP_SUPPLY` shares regardless of deposit
    /// size. New pools use the configured default fee rate.
    pub fn create_pool(
        &mut self,
        caller: &Address,
        token_x: TokenId,
        token_y: TokenId,
        initial_x: u64,
        initial_y: u64,
    ) -> AmmResult<PoolId> {
        self.ensure_active()?;
        self.atomic(|engine| engine.execute_create_pool(caller, token_x, token_y, initial_x, initial_y))
    }

    fn execute_create_pool(
        &mut self,
        caller: &Address,
        token_x: TokenId,
        token_y: TokenId,
        initial_x: u64,
        initial_y: u64,
    ) -> AmmResult<PoolId> {
        // 1. Validate pair and seed amounts
        if token_x == token_y {
            return Err(AmmError::InvalidPair);
        }
        if initial_x == 0 || initial_y == 0 {
            return Err(AmmError::ZeroLiquidity);
        }

        // 2. Allocate id and pull seed liquidity into custody
        let pool_id = self.next_id(ScalarKey::NextPoolId, FIRST_POOL_ID)?;
        let custody = custody_address(CustodyDomain::Pool, pool_id);
        self.transfer(&token_x, initial_x, caller, &custody)?;
        self.transfer(&token_y, initial_y, caller, &custody)?;

        // 3. Record pool
        let height = self.height;
        let mut pool = Pool {
            id: pool_id,
            token_x,
            token_y,
            reserve_x: initial_x,
            reserve_y: initial_y,
            lent_x: 0,
            lent_y: 0,
            total_lp_supply: INITIAL_LP_SUPPLY,
            fee_rate_bps: self.config.default_fee_bps,
            created_height: height,
            last_update_height: height,
            cumulative_fee_x: 0,
            cumulative_fee_y: 0,
            fee_growth_x: 0,
            fee_growth_y: 0,
            price_cumulative_last: 0,
            price_timestamp: height,
            twap: 0,
        };
        initialize_oracle(&mut pool, height);

        // 4. Mint bootstrap shares to the creator
        let mut position = LiquidityPosition::new(&pool, *caller);
        position.shares = INITIAL_LP_SUPPLY;

        self.save_pool(&pool)?;
        self.save_position(&position)?;

        self.emit(AmmEvent::PoolCreated {
            pool_id,
            creator: *caller,
            token_x,
            token_y,
            reserve_x: initial_x,
            reserve_y: initial_y,
            shares: INITIAL_LP_SUPPLY,
            block_height: height,
        });

        Ok(pool_id)
    }

    // ============ Queries ============

    pub fn pool(&self, pool_id: PoolId) -> AmmResult<Pool> {
        self.store
            .get(&StoreKey::Pool(pool_id))?
            .ok_or(AmmError::PoolNotFound { pool_id })
    }

    /// Every pool, in id order
    pub fn pools(&self) -> AmmResult<Vec<Pool>> {
        self.store.scan(Table::Pool)
    }

    pub fn position(&self, pool_id: PoolId, provider: &Address) -> AmmResult<Option<LiquidityPosition>> {
        self.store.get(&StoreKey::Position(pool_id, *provider))
    }

    /// Price an exact-input swap against the pool's current reserves
    pub fn quote(&self, pool_id: PoolId, amount_in: u64, direction: SwapDirection) -> AmmResult<SwapQuote> {
        let pool = self.pool(pool_id)?;
        let (reserve_in, reserve_out) = pool.reserves_for(direction);
        quote_exact_in(amount_in, reserve_in, reserve_out, pool.fee_rate_bps)
    }

    /// Time-weighted average price of X in Y
    pub fn get_twap(&self, pool_id: PoolId) -> AmmResult<u64> {
        let pool = self.pool(pool_id)?;
        read_twap(&pool, self.height, self.config.twap_max_age)
    }

    // ============ Persistence ============

    pub(crate) fn save_pool(&mut self, pool: &Pool) -> AmmResult<()> {
        self.store.put(&StoreKey::Pool(pool.id), pool)
    }

    /// Existing position, or a fresh one checkpointed at the pool's fee growth
    pub(crate) fn position_or_new(&self, pool: &Pool, provider: &Address) -> AmmResult<LiquidityPosition> {
        Ok(self
            .position(pool.id, provider)?
            .unwrap_or_else(|| LiquidityPosition::new(pool, *provider)))
    }

    /// Position that must already exist to cover `requested` shares
    pub(crate) fn existing_position(
        &self,
        pool_id: PoolId,
        provider: &Address,
        requested: u64,
    ) -> AmmResult<LiquidityPosition> {
        self.position(pool_id, provider)?
            .ok_or(AmmError::InsufficientBalance { available: 0, requested })
    }

    pub(crate) fn save_position(&mut self, position: &LiquidityPosition) -> AmmResult<()> {
        self.store
            .put(&StoreKey::Position(position.pool_id, position.provider), position)
    }
}

/// Reject a payout larger than what custody holds on `side`
pub(crate) fn ensure_on_hand(pool: &Pool, side: PoolSide, amount: u64) -> AmmResult<()> {
    let available = pool.available(side);
    if amount > available {
        return Err(AmmError::InsufficientLiquidity {
            available,
            requested: amount,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Engine, EngineConfig};
    use ledgerswap_common::{
        constants::pool::INITIAL_LP_SUPPLY,
        errors::AmmError,
        events::EventType,
        types::{Address, SwapDirection, TokenId},
    };

    const TOKEN_A: TokenId = [0xA1; 32];
    const TOKEN_B: TokenId = [0xB2; 32];

    fn owner() -> Address {
        [1u8; 32]
    }

    fn alice() -> Address {
        [2u8; 32]
    }

    fn funded_engine() -> Engine {
        let mut engine = Engine::with_store_ledger(EngineConfig::new(owner())).unwrap();
        engine.mint(&TOKEN_A, &alice(), 10_000_000).unwrap();
        engine.mint(&TOKEN_B, &alice(), 10_000_000).unwrap();
        engine.advance_height(100).unwrap();
        engine
    }

    #[test]
    fn test_create_pool() {
        let mut engine = funded_engine();

        let pool_id = engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000_000, 2_000_000).unwrap();
        assert_eq!(pool_id, 1);

        let pool = engine.pool(pool_id).unwrap();
        assert_eq!(pool.reserve_x, 1_000_000);
        assert_eq!(pool.reserve_y, 2_000_000);
        assert_eq!(pool.total_lp_supply, INITIAL_LP_SUPPLY);
        assert_eq!(pool.fee_rate_bps, 30);
        assert_eq!(pool.created_height, 100);

        let position = engine.position(pool_id, &alice()).unwrap().unwrap();
        assert_eq!(position.shares, INITIAL_LP_SUPPLY);

        assert_eq!(engine.balance_of(&TOKEN_A, &pool.custody()).unwrap(), 1_000_000);
        assert_eq!(engine.balance_of(&TOKEN_A, &alice()).unwrap(), 9_000_000);
        assert_eq!(engine.events().filter_by_type(EventType::PoolCreated).len(), 1);
    }

    #[test]
    fn test_pool_ids_are_monotonic() {
        let mut engine = funded_engine();
        let first = engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000, 1_000).unwrap();
        let second = engine.create_pool(&alice(), TOKEN_B, TOKEN_A, 1_000, 1_000).unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(engine.pools().unwrap().len(), 2);
    }

    #[test]
    fn test_create_pool_rejects_identical_tokens() {
        let mut engine = funded_engine();
        assert_eq!(
            engine.create_pool(&alice(), TOKEN_A, TOKEN_A, 1_000, 1_000),
            Err(AmmError::InvalidPair)
        );
    }

    #[test]
    fn test_create_pool_rejects_zero_amount() {
        let mut engine = funded_engine();
        assert_eq!(
            engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 0, 1_000),
            Err(AmmError::ZeroLiquidity)
        );
        assert_eq!(
            engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000, 0),
            Err(AmmError::ZeroLiquidity)
        );
    }

    #[test]
    fn test_failed_transfer_leaves_no_pool() {
        let mut engine = funded_engine();
        let err = engine
            .create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000, 20_000_000)
            .unwrap_err();
        assert!(matches!(err, AmmError::InsufficientBalance { .. }));

        // Neither the pool, the id nor the first transfer survived
        assert!(engine.pools().unwrap().is_empty());
        assert_eq!(engine.balance_of(&TOKEN_A, &alice()).unwrap(), 10_000_000);
        let pool_id = engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000, 1_000).unwrap();
        assert_eq!(pool_id, 1);
    }

    #[test]
    fn test_unknown_pool() {
        let engine = funded_engine();
        assert_eq!(engine.pool(42), Err(AmmError::PoolNotFound { pool_id: 42 }));
        assert!(engine.quote(42, 1, SwapDirection::XToY).is_err());
    }

    #[test]
    fn test_twap_staleness() {
        let mut engine = funded_engine();
        let pool_id = engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000_000, 1_000_000).unwrap();
        assert_eq!(engine.get_twap(pool_id).unwrap(), 100_000_000);

        let max_age = engine.config().twap_max_age;
        engine.advance_height(100 + max_age + 1).unwrap();
        assert!(matches!(engine.get_twap(pool_id), Err(AmmError::OracleStale { .. })));
    }
}
