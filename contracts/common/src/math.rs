//! Mathematical Utilities for LedgerSwap
//!
//! Constant-product pricing and LP share math. All divisions floor, which
//! always rounds in the pool's favour: the engine can never pay out more than
//! the reserves support.

use crate::constants::{fees::BPS_DENOMINATOR, pool::INITIAL_LP_SUPPLY, precision::FEE_GROWTH_SCALE, swap::MAX_PRICE_IMPACT_BPS};
use crate::errors::{AmmError, AmmResult};

/// Result of pricing an exact-input swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// Tokens paid out of the output reserve
    pub amount_out: u64,
    /// Fee portion of the input, in input tokens
    pub fee: u64,
    /// Input as a share of the input reserve (basis points)
    pub price_impact_bps: u64,
}

/// `a * b / c` with a `u128` intermediate, floored
pub fn mul_div(a: u64, b: u64, c: u64) -> AmmResult<u64> {
    if c == 0 {
        return Err(AmmError::DivisionByZero);
    }
    let result = (a as u128)
        .checked_mul(b as u128)
        .ok_or(AmmError::Overflow)?
        / c as u128;
    u64::try_from(result).map_err(|_| AmmError::Overflow)
}

/// Fee in basis points of `amount`
pub fn calculate_fee(amount: u64, fee_bps: u64) -> AmmResult<u64> {
    mul_div(amount, fee_bps, BPS_DENOMINATOR)
}

/// Price impact of consuming `amount_in` against `reserve_in`
///
/// impact = amount_in * 10000 / reserve_in
pub fn price_impact_bps(amount_in: u64, reserve_in: u64) -> AmmResult<u64> {
    if reserve_in == 0 {
        return Err(AmmError::ZeroLiquidity);
    }
    let impact = amount_in as u128 * BPS_DENOMINATOR as u128 / reserve_in as u128;
    Ok(impact.min(u64::MAX as u128) as u64)
}

/// Reject trades above the maximum price impact
pub fn check_price_impact(amount_in: u64, reserve_in: u64) -> AmmResult<u64> {
    let impact = price_impact_bps(amount_in, reserve_in)?;
    if impact > MAX_PRICE_IMPACT_BPS {
        return Err(AmmError::PriceImpactHigh {
            impact_bps: impact,
            max_bps: MAX_PRICE_IMPACT_BPS,
        });
    }
    Ok(impact)
}

/// Price an exact-input swap against a constant-product pool
///
/// ```text
/// fee_adjust = 10000 - fee_rate
/// amount_out = amount_in * reserve_out * fee_adjust
///              / (reserve_in * 10000 + amount_in * fee_adjust)
/// fee        = amount_in * fee_rate / 10000
/// ```
pub fn quote_exact_in(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_rate_bps: u64,
) -> AmmResult<SwapQuote> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::ZeroLiquidity);
    }
    if fee_rate_bps > BPS_DENOMINATOR {
        return Err(AmmError::InvalidInput {
            param: "fee_rate_bps",
            reason: "fee rate above 100%",
        });
    }

    let fee_adjust = (BPS_DENOMINATOR - fee_rate_bps) as u128;
    let amount_in_adjusted = (amount_in as u128)
        .checked_mul(fee_adjust)
        .ok_or(AmmError::Overflow)?;

    let numerator = amount_in_adjusted
        .checked_mul(reserve_out as u128)
        .ok_or(AmmError::Overflow)?;
    let denominator = (reserve_in as u128)
        .checked_mul(BPS_DENOMINATOR as u128)
        .ok_or(AmmError::Overflow)?
        .checked_add(amount_in_adjusted)
        .ok_or(AmmError::Overflow)?;

    let amount_out = numerator
        .checked_div(denominator)
        .ok_or(AmmError::DivisionByZero)?;

    Ok(SwapQuote {
        // amount_out < reserve_out, so it always fits
        amount_out: amount_out as u64,
        fee: calculate_fee(amount_in, fee_rate_bps)?,
        price_impact_bps: price_impact_bps(amount_in, reserve_in)?,
    })
}

/// LP shares minted for a deposit
///
/// Takes the smaller of the two proportional ratios so that neither side can
/// be over-credited; the surplus on the other side stays in the pool.
pub fn calculate_lp_shares(
    amount_x: u64,
    amount_y: u64,
    reserve_x: u64,
    reserve_y: u64,
    total_supply: u64,
) -> AmmResult<u64> {
    if total_supply == 0 {
        return Ok(INITIAL_LP_SUPPLY);
    }
    if reserve_x == 0 || reserve_y == 0 {
        return Err(AmmError::ZeroLiquidity);
    }

    let shares_x = mul_div(amount_x, total_supply, reserve_x)?;
    let shares_y = mul_div(amount_y, total_supply, reserve_y)?;
    Ok(shares_x.min(shares_y))
}

/// Reserves released by burning `shares`
pub fn calculate_withdrawal(
    shares: u64,
    reserve_x: u64,
    reserve_y: u64,
    total_supply: u64,
) -> AmmResult<(u64, u64)> {
    if shares > total_supply {
        return Err(AmmError::InsufficientBalance {
            available: total_supply,
            requested: shares,
        });
    }
    let amount_x = mul_div(shares, reserve_x, total_supply)?;
    let amount_y = mul_div(shares, reserve_y, total_supply)?;
    Ok((amount_x, amount_y))
}

/// Per-share fee growth contributed by one swap fee
pub fn fee_growth_delta(fee: u64, total_supply: u64) -> u128 {
    if total_supply == 0 {
        return 0;
    }
    fee as u128 * FEE_GROWTH_SCALE / total_supply as u128
}
