//! Governance Stake Module
//!
//! Time-locked staking of the governance token and the voting power it earns.
//!
//! - Power per stake is `amount * (1 + lock_heights / 1000)`, integer division,
//!   so locks under 1000 heights earn no bonus
//! - Power and amount add up across repeated stakes
//! - Each stake overwrites `lock_until_height` with `now + lock_heights`
//! - A staker may hand their power to one delegate; delegation survives restakes

use crate::constants::governance::LOCK_BONUS_PERIOD;
use crate::errors::{AmmError, AmmResult};
use crate::types::{Address, GovernanceStake};

/// Voting power earned by one stake
pub fn calculate_voting_power(amount: u64, lock_heights: u64) -> AmmResult<u64> {
    let multiplier = 1u64
        .checked_add(lock_heights / LOCK_BONUS_PERIOD)
        .ok_or(AmmError::Overflow)?;
    amount.checked_mul(multiplier).ok_or(AmmError::Overflow)
}

/// Add a stake to the record, returning the power it earned
pub fn apply_stake(
    stake: &mut GovernanceStake,
    amount: u64,
    lock_heights: u64,
    current_height: u64,
) -> AmmResult<u64> {
    if amount == 0 {
        return Err(AmmError::ZeroAmount);
    }

    let power = calculate_voting_power(amount, lock_heights)?;
    let lock_until = current_height
        .checked_add(lock_heights)
        .ok_or(AmmError::Overflow)?;

    stake.amount = stake.amount.checked_add(amount).ok_or(AmmError::Overflow)?;
    stake.voting_power = stake.voting_power.checked_add(power).ok_or(AmmError::Overflow)?;
    stake.lock_until_height = lock_until;
    stake.last_stake_height = current_height;

    Ok(power)
}

/// Point the stake's voting power at `delegate`, or take it back with `None`
pub fn apply_delegation(stake: &mut GovernanceStake, delegate: Option<Address>) -> AmmResult<()> {
    if delegate == Some(stake.staker) {
        return Err(AmmError::InvalidInput {
            param: "delegate",
            reason: "cannot delegate to self",
        });
    }
    stake.delegate = delegate;
    Ok(())
}

/// Power an account votes with: its own unless delegated away, plus
/// everything delegated to it. Delegation is one level deep.
pub fn effective_voting_power<'a>(
    account: &Address,
    stakes: impl IntoIterator<Item = &'a GovernanceStake>,
) -> u64 {
    stakes
        .into_iter()
        .filter(|stake| match stake.delegate {
            Some(delegate) => delegate == *account,
            None => stake.staker == *account,
        })
        .fold(0u64, |total, stake| total.saturating_add(stake.voting_power))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        [1u8; 32]
    }

    fn bob() -> Address {
        [2u8; 32]
    }

    #[test]
    fn test_voting_power_reference_stake() {
        // 500,000 locked for 2,000 heights earns a 3x multiplier
        assert_eq!(calculate_voting_power(500_000, 2_000).unwrap(), 1_500_000);
    }

    #[test]
    fn test_short_lock_has_no_bonus() {
        assert_eq!(calculate_voting_power(1_000, 999).unwrap(), 1_000);
        assert_eq!(calculate_voting_power(1_000, 1_000).unwrap(), 2_000);
    }

    #[test]
    fn test_restake_accumulates_and_overwrites_lock() {
        let mut stake = GovernanceStake::new(alice());
        apply_stake(&mut stake, 100, 5_000, 10).unwrap();
        assert_eq!(stake.lock_until_height, 5_010);

        apply_stake(&mut stake, 50, 0, 20).unwrap();
        assert_eq!(stake.amount, 150);
        assert_eq!(stake.voting_power, 600 + 50);
        // Overwritten, not extended
        assert_eq!(stake.lock_until_height, 20);
    }

    #[test]
    fn test_zero_stake_rejected() {
        let mut stake = GovernanceStake::new(alice());
        assert_eq!(apply_stake(&mut stake, 0, 100, 1), Err(AmmError::ZeroAmount));
    }

    #[test]
    fn test_delegation_survives_restake() {
        let mut stake = GovernanceStake::new(alice());
        apply_stake(&mut stake, 100, 0, 1).unwrap();
        apply_delegation(&mut stake, Some(bob())).unwrap();
        apply_stake(&mut stake, 100, 0, 2).unwrap();
        assert_eq!(stake.delegate, Some(bob()));
    }

    #[test]
    fn test_self_delegation_rejected() {
        let mut stake = GovernanceStake::new(alice());
        assert!(apply_delegation(&mut stake, Some(alice())).is_err());
    }

    #[test]
    fn test_effective_power_follows_delegation() {
        let mut a = GovernanceStake::new(alice());
        apply_stake(&mut a, 100, 0, 1).unwrap();
        let mut b = GovernanceStake::new(bob());
        apply_stake(&mut b, 40, 0, 1).unwrap();

        let stakes = [a.clone(), b.clone()];
        assert_eq!(effective_voting_power(&alice(), &stakes), 100);
        assert_eq!(effective_voting_power(&bob(), &stakes), 40);

        apply_delegation(&mut a, Some(bob())).unwrap();
        let stakes = [a, b];
        assert_eq!(effective_voting_power(&alice(), &stakes), 0);
        assert_eq!(effective_voting_power(&bob(), &stakes), 140);
    }
}
