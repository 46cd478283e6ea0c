//! Pool Price Oracle
//!
//! Every reserve-changing operation folds the price that held since the last
//! update into two accumulators before the reserves move:
//!
//! - `price_cumulative_last`: running sum of `spot * heights`, for consumers
//!   that diff two snapshots themselves (wraps on overflow)
//! - `twap`: moving average over `TWAP_WINDOW_HEIGHTS`; a single-height spike
//!   moves it by at most `1 / window` of the spike
//!
//! Prices are Y per X scaled by `PRICE_PRECISION`.

use crate::constants::oracle::{PRICE_PRECISION, TWAP_WINDOW_HEIGHTS};
use crate::errors::{AmmError, AmmResult};
use crate::types::Pool;

/// Spot price of X in Y, or `None` for an empty pool
pub fn spot_price(pool: &Pool) -> Option<u64> {
    if pool.reserve_x == 0 {
        return None;
    }
    let price = pool.reserve_y as u128 * PRICE_PRECISION / pool.reserve_x as u128;
    Some(price.min(u64::MAX as u128) as u64)
}

/// Seed the oracle for a freshly created pool
pub fn initialize_oracle(pool: &mut Pool, current_height: u64) {
    pool.twap = spot_price(pool).unwrap_or(0);
    pool.price_cumulative_last = 0;
    pool.price_timestamp = current_height;
}

/// Fold the prevailing spot price into the accumulators
///
/// Must run before reserves change so the heights since the last update are
/// credited to the price that actually held during them.
pub fn update_price_accumulators(pool: &mut Pool, current_height: u64) {
    let elapsed = current_height.saturating_sub(pool.price_timestamp);
    if elapsed == 0 {
        return;
    }

    if let Some(price) = spot_price(pool) {
        pool.price_cumulative_last = pool
            .price_cumulative_last
            .wrapping_add(price as u128 * elapsed as u128);

        let weight = elapsed.min(TWAP_WINDOW_HEIGHTS) as u128;
        let keep = TWAP_WINDOW_HEIGHTS as u128 - weight;
        let averaged = (pool.twap as u128 * keep + price as u128 * weight) / TWAP_WINDOW_HEIGHTS as u128;
        pool.twap = averaged as u64;
    }

    pool.price_timestamp = current_height;
}

/// Read the TWAP, failing if the pool has not been touched recently
pub fn read_twap(pool: &Pool, current_height: u64, max_age: u64) -> AmmResult<u64> {
    let age = current_height.saturating_sub(pool.price_timestamp);
    if age > max_age {
        return Err(AmmError::OracleStale {
            last_update_height: pool.price_timestamp,
            current_height,
            max_age,
        });
    }
    Ok(pool.twap)
}
