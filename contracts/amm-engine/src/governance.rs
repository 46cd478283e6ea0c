//! Governance staking
//!
//! Stakes are held by the governance vault. Withdrawal after the lock expires
//! is handled outside the engine.

use ledgerswap_common::{
    errors::{AmmError, AmmResult},
    events::AmmEvent,
    governance::{apply_delegation, apply_stake, effective_voting_power},
    store::{ScalarKey, StoreKey, Table},
    token_ops::TokenLedger,
    types::{governance_vault, Address, GovernanceStake, TokenId},
};

use crate::Engine;

impl<L: TokenLedger> Engine<L> {
    /// Lock `amount` governance tokens for `lock_heights`, returning the
    /// staker's total voting power
    pub fn stake_governance(&mut self, caller: &Address, amount: u64, lock_heights: u64) -> AmmResult<u64> {
        self.ensure_active()?;
        self.atomic(|engine| {
            let token = engine.governance_token()?.ok_or(AmmError::GovernanceTokenNotSet)?;

            let mut stake = engine.governance_stake(caller)?.unwrap_or_else(|| GovernanceStake::new(*caller));
            let power_added = apply_stake(&mut stake, amount, lock_heights, engine.height)?;

            engine.transfer(&token, amount, caller, &governance_vault())?;
            engine.save_stake(&stake)?;

            engine.emit(AmmEvent::GovernanceStaked {
                staker: *caller,
                amount,
                power_added,
                total_power: stake.voting_power,
                lock_until_height: stake.lock_until_height,
            });
            Ok(stake.voting_power)
        })
    }

    /// Hand the caller's voting power to `delegate`, or reclaim it with `None`
    pub fn delegate_governance(&mut self, caller: &Address, delegate: Option<Address>) -> AmmResult<()> {
        self.ensure_active()?;
        self.atomic(|engine| {
            let mut stake = engine
                .governance_stake(caller)?
                .ok_or(AmmError::StakeNotFound { staker: *caller })?;
            apply_delegation(&mut stake, delegate)?;
            engine.save_stake(&stake)?;

            engine.emit(AmmEvent::GovernanceDelegated {
                staker: *caller,
                delegate,
                block_height: engine.height,
            });
            Ok(())
        })
    }

    // ============ Queries ============

    pub fn governance_stake(&self, staker: &Address) -> AmmResult<Option<GovernanceStake>> {
        self.store.get(&StoreKey::GovernanceStake(*staker))
    }

    /// Power `account` votes with, including delegations to it
    pub fn voting_power_of(&self, account: &Address) -> AmmResult<u64> {
        let stakes: Vec<GovernanceStake> = self.store.scan(Table::GovernanceStake)?;
        Ok(effective_voting_power(account, &stakes))
    }

    pub fn governance_token(&self) -> AmmResult<Option<TokenId>> {
        self.store.get(&StoreKey::Scalar(ScalarKey::GovernanceToken))
    }

    fn save_stake(&mut self, stake: &GovernanceStake) -> AmmResult<()> {
        self.store.put(&StoreKey::GovernanceStake(stake.staker), stake)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Engine, EngineConfig};
    use ledgerswap_common::{
        errors::AmmError,
        types::{governance_vault, Address, TokenId},
    };

    const GOV: TokenId = [0x60; 32];

    fn owner() -> Address {
        [1u8; 32]
    }

    fn alice() -> Address {
        [2u8; 32]
    }

    fn bob() -> Address {
        [3u8; 32]
    }

    fn setup() -> Engine {
        let mut engine = Engine::with_store_ledger(EngineConfig::new(owner())).unwrap();
        engine.mint(&GOV, &alice(), 1_000_000).unwrap();
        engine.mint(&GOV, &bob(), 1_000_000).unwrap();
        engine.set_governance_token(&owner(), GOV).unwrap();
        engine.advance_height(10).unwrap();
        engine
    }

    #[test]
    fn test_stake_governance() {
        let mut engine = setup();
        let power = engine.stake_governance(&alice(), 500_000, 2_000).unwrap();
        assert_eq!(power, 1_500_000);

        let stake = engine.governance_stake(&alice()).unwrap().unwrap();
        assert_eq!(stake.amount, 500_000);
        assert_eq!(stake.lock_until_height, 2_010);
        assert_eq!(engine.balance_of(&GOV, &governance_vault()).unwrap(), 500_000);
        assert_eq!(engine.voting_power_of(&alice()).unwrap(), 1_500_000);
    }

    #[test]
    fn test_stake_requires_governance_token() {
        let mut engine = Engine::with_store_ledger(EngineConfig::new(owner())).unwrap();
        assert_eq!(
            engine.stake_governance(&alice(), 1, 0),
            Err(AmmError::GovernanceTokenNotSet)
        );
    }

    #[test]
    fn test_restake_is_additive() {
        let mut engine = setup();
        engine.stake_governance(&alice(), 100_000, 1_000).unwrap();
        engine.advance_height(20).unwrap();
        let power = engine.stake_governance(&alice(), 100_000, 0).unwrap();

        assert_eq!(power, 200_000 + 100_000);
        let stake = engine.governance_stake(&alice()).unwrap().unwrap();
        assert_eq!(stake.lock_until_height, 20);
    }

    #[test]
    fn test_delegation() {
        let mut engine = setup();
        engine.stake_governance(&alice(), 100, 0).unwrap();
        engine.stake_governance(&bob(), 50, 0).unwrap();

        engine.delegate_governance(&alice(), Some(bob())).unwrap();
        assert_eq!(engine.voting_power_of(&alice()).unwrap(), 0);
        assert_eq!(engine.voting_power_of(&bob()).unwrap(), 150);

        engine.delegate_governance(&alice(), None).unwrap();
        assert_eq!(engine.voting_power_of(&alice()).unwrap(), 100);
    }

    #[test]
    fn test_delegation_requires_stake() {
        let mut engine = setup();
        assert_eq!(
            engine.delegate_governance(&alice(), Some(bob())),
            Err(AmmError::StakeNotFound { staker: alice() })
        );
    }

    #[test]
    fn test_stake_beyond_balance_leaves_no_record() {
        let mut engine = setup();
        assert!(engine.stake_governance(&alice(), 2_000_000, 0).is_err());
        assert!(engine.governance_stake(&alice()).unwrap().is_none());
    }
}
