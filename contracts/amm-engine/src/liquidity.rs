//! Liquidity Accounting
//!
//! Deposits mint shares at the smaller of the two proportional ratios;
//! withdrawals burn unstaked shares for the proportional reserves. Positions
//! settle their share of swap fees every time they are touched.

use ledgerswap_common::{
    errors::{AmmError, AmmResult},
    events::AmmEvent,
    math::{calculate_lp_shares, calculate_withdrawal, mul_div},
    oracle::update_price_accumulators,
    token_ops::TokenLedger,
    types::{Address, PoolId, PoolSide},
};

use crate::{pools::ensure_on_hand, Engine};

impl<L: TokenLedger> Engine<L> {
    /// Deposit both tokens, returning the shares minted
    ///
    /// The side in excess of the pool ratio is kept by the pool.
    pub fn add_liquidity(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        amount_x: u64,
        amount_y: u64,
        min_shares: u64,
    ) -> AmmResult<u64> {
        self.ensure_active()?;
        self.atomic(|engine| {
            // 1. Validate deposit
            if amount_x == 0 || amount_y == 0 {
                return Err(AmmError::ZeroLiquidity);
            }
            let mut pool = engine.pool(pool_id)?;

            // 2. Shares at the smaller ratio
            let shares = calculate_lp_shares(
                amount_x,
                amount_y,
                pool.reserve_x,
                pool.reserve_y,
                pool.total_lp_supply,
            )?;
            if shares == 0 || shares < min_shares {
                return Err(AmmError::MinTokensNotMet {
                    minimum: min_shares.max(1),
                    actual: shares,
                });
            }

            // 3. Pull tokens
            update_price_accumulators(&mut pool, engine.height);
            let custody = pool.custody();
            engine.transfer(&pool.token_x, amount_x, caller, &custody)?;
            engine.transfer(&pool.token_y, amount_y, caller, &custody)?;

            // 4. Update pool and position
            pool.reserve_x = pool.reserve_x.checked_add(amount_x).ok_or(AmmError::Overflow)?;
            pool.reserve_y = pool.reserve_y.checked_add(amount_y).ok_or(AmmError::Overflow)?;
            pool.total_lp_supply = pool
                .total_lp_supply
                .checked_add(shares)
                .ok_or(AmmError::Overflow)?;
            pool.last_update_height = engine.height;

            let mut position = engine.position_or_new(&pool, caller)?;
            position.settle_fees(&pool);
            position.shares = position.shares.checked_add(shares).ok_or(AmmError::Overflow)?;

            engine.save_pool(&pool)?;
            engine.save_position(&position)?;

            engine.emit(AmmEvent::LiquidityAdded {
                pool_id,
                provider: *caller,
                amount_x,
                amount_y,
                shares,
                block_height: engine.height,
            });

            Ok(shares)
        })
    }

    /// Burn unstaked shares for the proportional reserves
    ///
    /// The last shares of a pool cannot be burned.
    pub fn remove_liquidity(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        shares: u64,
        min_x: u64,
        min_y: u64,
    ) -> AmmResult<(u64, u64)> {
        self.ensure_active()?;
        self.atomic(|engine| {
            // 1. Validate burn
            if shares == 0 {
                return Err(AmmError::ZeroAmount);
            }
            let mut pool = engine.pool(pool_id)?;
            let mut position = engine.existing_position(pool_id, caller, shares)?;

            let available = position.unstaked_shares();
            if available < shares {
                return Err(AmmError::InsufficientBalance {
                    available,
                    requested: shares,
                });
            }
            if shares >= pool.total_lp_supply {
                return Err(AmmError::ZeroLiquidity);
            }

            // 2. Proportional amounts
            let (amount_x, amount_y) =
                calculate_withdrawal(shares, pool.reserve_x, pool.reserve_y, pool.total_lp_supply)?;
            if amount_x < min_x {
                return Err(AmmError::MinTokensNotMet { minimum: min_x, actual: amount_x });
            }
            if amount_y < min_y {
                return Err(AmmError::MinTokensNotMet { minimum: min_y, actual: amount_y });
            }

            // 3. Settle fees, then shrink them with the position
            position.settle_fees(&pool);
            let kept = position.shares - shares;
            position.unclaimed_fee_x = mul_div(position.unclaimed_fee_x, kept, position.shares)?;
            position.unclaimed_fee_y = mul_div(position.unclaimed_fee_y, kept, position.shares)?;
            position.shares = kept;

            // 4. Pay out of what custody holds
            ensure_on_hand(&pool, PoolSide::X, amount_x)?;
            ensure_on_hand(&pool, PoolSide::Y, amount_y)?;
            update_price_accumulators(&mut pool, engine.height);
            let custody = pool.custody();
            engine.transfer(&pool.token_x, amount_x, &custody, caller)?;
            engine.transfer(&pool.token_y, amount_y, &custody, caller)?;

            pool.reserve_x -= amount_x;
            pool.reserve_y -= amount_y;
            pool.total_lp_supply -= shares;
            pool.last_update_height = engine.height;

            engine.save_pool(&pool)?;
            engine.save_position(&position)?;

            engine.emit(AmmEvent::LiquidityRemoved {
                pool_id,
                provider: *caller,
                shares,
                amount_x,
                amount_y,
                block_height: engine.height,
            });

            Ok((amount_x, amount_y))
        })
    }

    /// Swap fees earned by a position and not yet realised
    pub fn pending_fees(&self, pool_id: PoolId, provider: &Address) -> AmmResult<(u64, u64)> {
        let pool = self.pool(pool_id)?;
        match self.position(pool_id, provider)? {
            Some(mut position) => {
                position.settle_fees(&pool);
                Ok((position.unclaimed_fee_x, position.unclaimed_fee_y))
            }
            None => Ok((0, 0)),
        }
    }
}
