//! Yield Farm Module
//!
//! Accumulated-reward-per-share accrual for staked LP shares.
//!
//! ## Model
//!
//! - The farm keeps one monotonically increasing counter,
//!   `acc_reward_per_share`, scaled by `REWARD_MULTIPLIER`
//! - Each position checkpoints the counter when it is settled
//! - A position's pending reward is `staked * (acc - checkpoint) / MULTIPLIER`
//!   plus whatever was settled earlier and not yet paid
//!
//! Every stake change first accrues the farm to the current height and
//! settles the position, so no height is ever credited twice.

use crate::constants::farm::REWARD_MULTIPLIER;
use crate::errors::{AmmError, AmmResult};
use crate::types::{LiquidityPosition, YieldFarm};

/// Reward payout decided by a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// Tokens to transfer to the staker now
    pub paid: u64,
    /// Rewards that stay owed because the farm ran dry
    pub remaining: u64,
}

/// Bring the farm's reward counter up to `current_height`
pub fn accrue(farm: &mut YieldFarm, current_height: u64) -> AmmResult<()> {
    let elapsed = current_height.saturating_sub(farm.last_reward_height);

    if elapsed > 0 && farm.total_staked > 0 {
        let increment = (elapsed as u128)
            .checked_mul(farm.reward_per_height as u128)
            .ok_or(AmmError::Overflow)?
            .checked_mul(REWARD_MULTIPLIER)
            .ok_or(AmmError::Overflow)?
            / farm.total_staked as u128;

        farm.acc_reward_per_share = farm
            .acc_reward_per_share
            .checked_add(increment)
            .ok_or(AmmError::Overflow)?;
    }

    farm.last_reward_height = farm.last_reward_height.max(current_height);
    Ok(())
}

/// Rewards earned by the position's stake since its checkpoint
fn earned_since_checkpoint(farm: &YieldFarm, position: &LiquidityPosition) -> AmmResult<u64> {
    let delta = farm.acc_reward_per_share.saturating_sub(position.reward_checkpoint);
    let earned = (position.staked_amount as u128)
        .checked_mul(delta)
        .ok_or(AmmError::Overflow)?
        / REWARD_MULTIPLIER;
    u64::try_from(earned).map_err(|_| AmmError::Overflow)
}

/// Move newly earned rewards into the position's unclaimed balance
pub fn settle_rewards(farm: &YieldFarm, position: &mut LiquidityPosition) -> AmmResult<u64> {
    let earned = earned_since_checkpoint(farm, position)?;
    position.unclaimed_rewards = position
        .unclaimed_rewards
        .checked_add(earned)
        .ok_or(AmmError::Overflow)?;
    position.reward_checkpoint = farm.acc_reward_per_share;
    Ok(earned)
}

/// Rewards the position could claim at `current_height`, without mutating
pub fn pending_rewards(
    farm: &YieldFarm,
    position: &LiquidityPosition,
    current_height: u64,
) -> AmmResult<u64> {
    let mut projected = farm.clone();
    accrue(&mut projected, current_height)?;
    earned_since_checkpoint(&projected, position)?
        .checked_add(position.unclaimed_rewards)
        .ok_or(AmmError::Overflow)
}

/// Informational per-staker estimate: `elapsed * reward_per_height * stake / total_staked`
/// over the staker's own window since their last stake.
///
/// This ignores checkpoints and other stakers' history, so it disagrees with
/// [`pending_rewards`] whenever the stake distribution changed in between.
/// Payouts always use [`pending_rewards`].
pub fn linear_reward_estimate(
    farm: &YieldFarm,
    position: &LiquidityPosition,
    current_height: u64,
) -> u64 {
    if farm.total_staked == 0 || position.staked_amount == 0 {
        return 0;
    }
    let elapsed = current_height.saturating_sub(position.last_stake_height);
    let estimate = elapsed as u128 * farm.reward_per_height as u128 * position.staked_amount as u128
        / farm.total_staked as u128;
    estimate.min(u64::MAX as u128) as u64
}

/// Stake `amount` of the position's free LP shares
pub fn apply_stake(
    farm: &mut YieldFarm,
    position: &mut LiquidityPosition,
    amount: u64,
    current_height: u64,
) -> AmmResult<()> {
    if amount == 0 {
        return Err(AmmError::ZeroAmount);
    }
    let available = position.unstaked_shares();
    if available < amount {
        return Err(AmmError::InsufficientBalance {
            available,
            requested: amount,
        });
    }

    accrue(farm, current_height)?;
    settle_rewards(farm, position)?;

    position.staked_amount += amount;
    position.last_stake_height = current_height;
    farm.total_staked = farm.total_staked.checked_add(amount).ok_or(AmmError::Overflow)?;
    Ok(())
}

/// Release `amount` of the position's staked shares
pub fn apply_unstake(
    farm: &mut YieldFarm,
    position: &mut LiquidityPosition,
    amount: u64,
    current_height: u64,
) -> AmmResult<()> {
    if amount == 0 {
        return Err(AmmError::ZeroAmount);
    }
    if position.staked_amount < amount {
        return Err(AmmError::InsufficientBalance {
            available: position.staked_amount,
            requested: amount,
        });
    }

    accrue(farm, current_height)?;
    settle_rewards(farm, position)?;

    position.staked_amount -= amount;
    farm.total_staked = farm.total_staked.checked_sub(amount).ok_or(AmmError::Underflow)?;
    Ok(())
}

/// Settle the position and pay out as much as the farm holds
pub fn apply_claim(
    farm: &mut YieldFarm,
    position: &mut LiquidityPosition,
    current_height: u64,
) -> AmmResult<ClaimOutcome> {
    accrue(farm, current_height)?;
    settle_rewards(farm, position)?;

    let paid = position.unclaimed_rewards.min(farm.reward_balance);
    position.unclaimed_rewards -= paid;
    farm.reward_balance -= paid;
    farm.total_rewards_paid = farm.total_rewards_paid.saturating_add(paid);

    Ok(ClaimOutcome {
        paid,
        remaining: position.unclaimed_rewards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pool;

    fn test_farm() -> YieldFarm {
        YieldFarm {
            pool_id: 1,
            reward_token: [7u8; 32],
            reward_per_height: 100,
            total_staked: 0,
            last_reward_height: 10,
            acc_reward_per_share: 0,
            reward_balance: 1_000_000,
            total_rewards_paid: 0,
            created_height: 10,
        }
    }

    fn test_position(provider: u8, shares: u64) -> LiquidityPosition {
        let pool = Pool {
            id: 1,
            token_x: [1u8; 32],
            token_y: [2u8; 32],
            reserve_x: 1_000,
            reserve_y: 1_000,
            lent_x: 0,
            lent_y: 0,
            total_lp_supply: 1_000_000,
            fee_rate_bps: 30,
            created_height: 1,
            last_update_height: 1,
            cumulative_fee_x: 0,
            cumulative_fee_y: 0,
            fee_growth_x: 0,
            fee_growth_y: 0,
            price_cumulative_last: 0,
            price_timestamp: 1,
            twap: 0,
        };
        let mut position = LiquidityPosition::new(&pool, [provider; 32]);
        position.shares = shares;
        position
    }

    #[test]
    fn test_accrue_with_nothing_staked_only_stamps_height() {
        let mut farm = test_farm();
        accrue(&mut farm, 50).unwrap();
        assert_eq!(farm.acc_reward_per_share, 0);
        assert_eq!(farm.last_reward_height, 50);
    }

    #[test]
    fn test_accrue_increases_per_share_counter() {
        let mut farm = test_farm();
        farm.total_staked = 1_000;
        accrue(&mut farm, 20).unwrap();
        // 10 heights * 100 per height / 1000 staked = 1 per share
        assert_eq!(farm.acc_reward_per_share, REWARD_MULTIPLIER);
    }

    #[test]
    fn test_single_staker_earns_full_stream() {
        let mut farm = test_farm();
        let mut alice = test_position(1, 1_000);

        apply_stake(&mut farm, &mut alice, 1_000, 10).unwrap();
        assert_eq!(pending_rewards(&farm, &alice, 30).unwrap(), 2_000);

        let outcome = apply_claim(&mut farm, &mut alice, 30).unwrap();
        assert_eq!(outcome, ClaimOutcome { paid: 2_000, remaining: 0 });
        assert_eq!(farm.reward_balance, 998_000);
    }

    #[test]
    fn test_late_staker_does_not_earn_past_rewards() {
        let mut farm = test_farm();
        let mut alice = test_position(1, 1_000);
        let mut bob = test_position(2, 1_000);

        apply_stake(&mut farm, &mut alice, 1_000, 10).unwrap();
        apply_stake(&mut farm, &mut bob, 1_000, 20).unwrap();

        // Alice: 10 heights alone (1000) + 10 heights shared (500)
        assert_eq!(pending_rewards(&farm, &alice, 30).unwrap(), 1_500);
        // Bob: 10 heights shared only
        assert_eq!(pending_rewards(&farm, &bob, 30).unwrap(), 500);
    }

    #[test]
    fn test_linear_estimate_diverges_from_canonical() {
        let mut farm = test_farm();
        let mut alice = test_position(1, 1_000);
        let mut bob = test_position(2, 1_000);

        apply_stake(&mut farm, &mut alice, 1_000, 10).unwrap();
        apply_stake(&mut farm, &mut bob, 1_000, 20).unwrap();

        // Linear estimate sees only today's 50% share over alice's whole window
        assert_eq!(linear_reward_estimate(&farm, &alice, 30), 1_000);
        assert_eq!(pending_rewards(&farm, &alice, 30).unwrap(), 1_500);
    }

    #[test]
    fn test_cannot_stake_more_than_free_shares() {
        let mut farm = test_farm();
        let mut alice = test_position(1, 100);
        let err = apply_stake(&mut farm, &mut alice, 101, 10).unwrap_err();
        assert_eq!(err, AmmError::InsufficientBalance { available: 100, requested: 101 });
    }

    #[test]
    fn test_unstake_keeps_earned_rewards() {
        let mut farm = test_farm();
        let mut alice = test_position(1, 1_000);

        apply_stake(&mut farm, &mut alice, 1_000, 10).unwrap();
        apply_unstake(&mut farm, &mut alice, 1_000, 15).unwrap();

        assert_eq!(farm.total_staked, 0);
        assert_eq!(alice.unclaimed_rewards, 500);
        // Nothing more accrues with zero stake
        assert_eq!(pending_rewards(&farm, &alice, 100).unwrap(), 500);
    }

    #[test]
    fn test_claim_caps_at_farm_balance() {
        let mut farm = test_farm();
        farm.reward_balance = 300;
        let mut alice = test_position(1, 1_000);

        apply_stake(&mut farm, &mut alice, 1_000, 10).unwrap();
        let outcome = apply_claim(&mut farm, &mut alice, 20).unwrap();
        assert_eq!(outcome, ClaimOutcome { paid: 300, remaining: 700 });
        assert_eq!(farm.reward_balance, 0);
    }
}
