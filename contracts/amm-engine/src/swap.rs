//! Swap Execution
//!
//! Exact-input swaps against a single pool, and routes threading one hop's
//! output into the next.
//!
//! ## Single hop
//!
//! 1. Reject zero input and trades above the price-impact limit
//! 2. Price the trade with the constant-product formula
//! 3. Enforce the caller's minimum output
//! 4. Fold the pre-trade price into the oracle
//! 5. Pull input, push output, update reserves and fee accounting
//!
//! ## Multi hop
//!
//! Hops run in order inside one transaction, with no per-hop minimum. Only the
//! final output is checked against the caller's minimum, and any failing hop
//! undoes every earlier one.

use ledgerswap_common::{
    errors::{AmmError, AmmResult},
    events::AmmEvent,
    math::{check_price_impact, fee_growth_delta, quote_exact_in},
    oracle::update_price_accumulators,
    token_ops::TokenLedger,
    types::{Address, PoolId, PoolSide, SwapDirection, TokenId},
};

use crate::{pools::ensure_on_hand, Engine};

/// Result of one executed hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub pool_id: PoolId,
    pub direction: SwapDirection,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
    /// Token paid out by this hop
    pub token_out: TokenId,
}

impl<L: TokenLedger> Engine<L> {
    /// Swap exactly `amount_in` through one pool, returning the output paid
    pub fn swap_exact_in(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        direction: SwapDirection,
        amount_in: u64,
        min_amount_out: u64,
    ) -> AmmResult<u64> {
        self.ensure_active()?;
        self.atomic(|engine| {
            engine
                .execute_swap(caller, pool_id, direction, amount_in, min_amount_out)
                .map(|outcome| outcome.amount_out)
        })
    }

    /// Swap `token_in` along `path`, returning the final output
    ///
    /// Each hop's direction follows from the token arriving at that pool.
    pub fn multi_hop_swap(
        &mut self,
        caller: &Address,
        path: &[PoolId],
        token_in: TokenId,
        amount_in: u64,
        min_amount_out: u64,
    ) -> AmmResult<u64> {
        self.ensure_active()?;

        if path.is_empty() {
            return Err(AmmError::InvalidPath { reason: "empty path" });
        }
        if path.len() > self.config.max_hops as usize {
            return Err(AmmError::InvalidPath { reason: "too many hops" });
        }

        self.atomic(|engine| {
            let (amount_out, _) = path.iter().try_fold(
                (amount_in, token_in),
                |(amount, token), &pool_id| -> AmmResult<(u64, TokenId)> {
                    let pool = engine.pool(pool_id)?;
                    let direction = pool.direction_for(&token).ok_or(AmmError::InvalidPair)?;
                    let outcome = engine.execute_swap(caller, pool_id, direction, amount, 0)?;
                    Ok((outcome.amount_out, outcome.token_out))
                },
            )?;

            if amount_out < min_amount_out {
                return Err(AmmError::SlippageExceeded {
                    minimum: min_amount_out,
                    actual: amount_out,
                });
            }

            engine.emit(AmmEvent::MultiHopSwap {
                trader: *caller,
                hops: path.len() as u32,
                amount_in,
                amount_out,
                block_height: engine.height,
            });
            Ok(amount_out)
        })
    }

    /// One hop; the caller owns the surrounding transaction
    pub(crate) fn execute_swap(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        direction: SwapDirection,
        amount_in: u64,
        min_amount_out: u64,
    ) -> AmmResult<SwapOutcome> {
        // 1. Validate input against the pre-trade reserve
        if amount_in == 0 {
            return Err(AmmError::ZeroAmount);
        }
        let mut pool = self.pool(pool_id)?;
        let (reserve_in, reserve_out) = pool.reserves_for(direction);
        check_price_impact(amount_in, reserve_in)?;

        // 2. Price
        let quote = quote_exact_in(amount_in, reserve_in, reserve_out, pool.fee_rate_bps)?;
        if quote.amount_out == 0 {
            return Err(AmmError::ZeroOutput);
        }

        // 3. Slippage
        if quote.amount_out < min_amount_out {
            return Err(AmmError::SlippageExceeded {
                minimum: min_amount_out,
                actual: quote.amount_out,
            });
        }

        // 4. Oracle sees the price that held before this trade
        update_price_accumulators(&mut pool, self.height);

        // 5. Settle tokens
        let side_in = direction.input_side();
        let side_out = side_in.other();
        let token_in = pool.token(side_in);
        let token_out = pool.token(side_out);
        ensure_on_hand(&pool, side_out, quote.amount_out)?;
        let custody = pool.custody();
        self.transfer(&token_in, amount_in, caller, &custody)?;
        self.transfer(&token_out, quote.amount_out, &custody, caller)?;

        // 6. Reserves and fee accounting
        let reserve = pool.reserve_mut(side_in);
        *reserve = reserve.checked_add(amount_in).ok_or(AmmError::Overflow)?;
        let reserve = pool.reserve_mut(side_out);
        *reserve = reserve.checked_sub(quote.amount_out).ok_or(AmmError::Underflow)?;

        let growth = fee_growth_delta(quote.fee, pool.total_lp_supply);
        match side_in {
            PoolSide::X => {
                pool.cumulative_fee_x = pool.cumulative_fee_x.saturating_add(quote.fee);
                pool.fee_growth_x = pool.fee_growth_x.saturating_add(growth);
            }
            PoolSide::Y => {
                pool.cumulative_fee_y = pool.cumulative_fee_y.saturating_add(quote.fee);
                pool.fee_growth_y = pool.fee_growth_y.saturating_add(growth);
            }
        }
        pool.last_update_height = self.height;

        self.save_pool(&pool)?;
        self.credit_treasury(quote.fee)?;

        self.emit(AmmEvent::Swap {
            pool_id,
            trader: *caller,
            direction,
            amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            block_height: self.height,
        });

        Ok(SwapOutcome {
            pool_id,
            direction,
            amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            token_out,
        })
    }
}
