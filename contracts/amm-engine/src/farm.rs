//! Yield farm operations
//!
//! Stakes are LP shares of the farm's pool; staked shares cannot be burned
//! until unstaked.

use ledgerswap_common::{
    errors::{AmmError, AmmResult},
    events::AmmEvent,
    farm::{self as accrual, pending_rewards},
    store::StoreKey,
    token_ops::TokenLedger,
    types::{Address, PoolId, TokenId, YieldFarm},
};

use crate::Engine;

impl<L: TokenLedger> Engine<L> {
    /// Attach a reward stream to a pool (owner only)
    pub fn create_farm(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        reward_token: TokenId,
        reward_per_height: u64,
    ) -> AmmResult<()> {
        self.ensure_active()?;
        self.ensure_owner(caller)?;
        self.atomic(|engine| {
            engine.pool(pool_id)?;
            if engine.store.get::<YieldFarm>(&StoreKey::Farm(pool_id))?.is_some() {
                return Err(AmmError::FarmAlreadyExists { pool_id });
            }
            if reward_per_height == 0 {
                return Err(AmmError::InvalidInput {
                    param: "reward_per_height",
                    reason: "must be positive",
                });
            }

            let farm = YieldFarm {
                pool_id,
                reward_token,
                reward_per_height,
                total_staked: 0,
                last_reward_height: engine.height,
                acc_reward_per_share: 0,
                reward_balance: 0,
                total_rewards_paid: 0,
                created_height: engine.height,
            };
            engine.save_farm(&farm)?;

            engine.emit(AmmEvent::FarmCreated {
                pool_id,
                reward_token,
                reward_per_height,
                block_height: engine.height,
            });
            Ok(())
        })
    }

    /// Add reward tokens to a farm's payout balance
    pub fn fund_farm(&mut self, caller: &Address, pool_id: PoolId, amount: u64) -> AmmResult<u64> {
        self.ensure_active()?;
        self.atomic(|engine| {
            if amount == 0 {
                return Err(AmmError::ZeroAmount);
            }
            let mut farm = engine.farm(pool_id)?;
            accrual::accrue(&mut farm, engine.height)?;

            engine.transfer(&farm.reward_token, amount, caller, &farm.custody())?;
            farm.reward_balance = farm.reward_balance.checked_add(amount).ok_or(AmmError::Overflow)?;
            engine.save_farm(&farm)?;

            engine.emit(AmmEvent::FarmFunded {
                pool_id,
                funder: *caller,
                amount,
                reward_balance: farm.reward_balance,
            });
            Ok(farm.reward_balance)
        })
    }

    /// Stake `amount` of the caller's unstaked LP shares
    pub fn stake_in_farm(&mut self, caller: &Address, pool_id: PoolId, amount: u64) -> AmmResult<()> {
        self.ensure_active()?;
        self.atomic(|engine| {
            let mut farm = engine.farm(pool_id)?;
            let mut position = engine.existing_position(pool_id, caller, amount)?;

            accrual::apply_stake(&mut farm, &mut position, amount, engine.height)?;

            engine.save_farm(&farm)?;
            engine.save_position(&position)?;

            engine.emit(AmmEvent::FarmStaked {
                pool_id,
                staker: *caller,
                amount,
                total_staked: farm.total_staked,
                block_height: engine.height,
            });
            Ok(())
        })
    }

    pub fn unstake_from_farm(&mut self, caller: &Address, pool_id: PoolId, amount: u64) -> AmmResult<()> {
        self.ensure_active()?;
        self.atomic(|engine| {
            let mut farm = engine.farm(pool_id)?;
            let mut position = engine.existing_position(pool_id, caller, amount)?;

            accrual::apply_unstake(&mut farm, &mut position, amount, engine.height)?;

            engine.save_farm(&farm)?;
            engine.save_position(&position)?;

            engine.emit(AmmEvent::FarmUnstaked {
                pool_id,
                staker: *caller,
                amount,
                total_staked: farm.total_staked,
                block_height: engine.height,
            });
            Ok(())
        })
    }

    /// Pay out settled rewards, up to what the farm holds
    pub fn claim_rewards(&mut self, caller: &Address, pool_id: PoolId) -> AmmResult<u64> {
        self.ensure_active()?;
        self.atomic(|engine| {
            let mut farm = engine.farm(pool_id)?;
            let mut position = engine.existing_position(pool_id, caller, 0)?;

            let outcome = accrual::apply_claim(&mut farm, &mut position, engine.height)?;
            engine.transfer(&farm.reward_token, outcome.paid, &farm.custody(), caller)?;

            engine.save_farm(&farm)?;
            engine.save_position(&position)?;

            engine.emit(AmmEvent::RewardsClaimed {
                pool_id,
                staker: *caller,
                amount: outcome.paid,
                remaining: outcome.remaining,
                block_height: engine.height,
            });
            Ok(outcome.paid)
        })
    }

    // ============ Queries ============

    pub fn farm(&self, pool_id: PoolId) -> AmmResult<YieldFarm> {
        self.store
            .get(&StoreKey::Farm(pool_id))?
            .ok_or(AmmError::FarmNotFound { pool_id })
    }

    /// Rewards `staker` could claim now
    pub fn calculate_rewards(&self, pool_id: PoolId, staker: &Address) -> AmmResult<u64> {
        let farm = self.farm(pool_id)?;
        match self.position(pool_id, staker)? {
            Some(position) => pending_rewards(&farm, &position, self.height),
            None => Ok(0),
        }
    }

    /// Per-staker linear estimate over the staker's own window; see
    /// [`accrual::linear_reward_estimate`]. Not used for payouts.
    pub fn linear_reward_estimate(&self, pool_id: PoolId, staker: &Address) -> AmmResult<u64> {
        let farm = self.farm(pool_id)?;
        Ok(self
            .position(pool_id, staker)?
            .map(|position| accrual::linear_reward_estimate(&farm, &position, self.height))
            .unwrap_or(0))
    }

    fn save_farm(&mut self, farm: &YieldFarm) -> AmmResult<()> {
        self.store.put(&StoreKey::Farm(farm.pool_id), farm)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Engine, EngineConfig};
    use ledgerswap_common::{
        errors::AmmError,
        types::{Address, TokenId},
    };

    const TOKEN_A: TokenId = [0xA1; 32];
    const TOKEN_B: TokenId = [0xB2; 32];
    const REWARD: TokenId = [0xEE; 32];

    fn owner() -> Address {
        [1u8; 32]
    }

    fn alice() -> Address {
        [2u8; 32]
    }

    fn bob() -> Address {
        [3u8; 32]
    }

    /// Pool 1 (alice 1M shares, bob 1M shares) with a 100/height farm holding 1M rewards
    fn setup() -> Engine {
        let mut engine = Engine::with_store_ledger(EngineConfig::new(owner())).unwrap();
        for account in [alice(), bob()] {
            engine.mint(&TOKEN_A, &account, 10_000_000).unwrap();
            engine.mint(&TOKEN_B, &account, 10_000_000).unwrap();
        }
        engine.mint(&REWARD, &owner(), 1_000_000).unwrap();
        engine.advance_height(100).unwrap();

        engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000_000, 1_000_000).unwrap();
        engine.add_liquidity(&bob(), 1, 1_000_000, 1_000_000, 0).unwrap();
        engine.create_farm(&owner(), 1, REWARD, 100).unwrap();
        engine.fund_farm(&owner(), 1, 1_000_000).unwrap();
        engine
    }

    #[test]
    fn test_create_farm_owner_only() {
        let mut engine = setup();
        let err = engine.create_farm(&alice(), 1, REWARD, 10).unwrap_err();
        assert!(matches!(err, AmmError::NotAuthorized { .. }));
        assert_eq!(
            engine.create_farm(&owner(), 1, REWARD, 10),
            Err(AmmError::FarmAlreadyExists { pool_id: 1 })
        );
        assert_eq!(
            engine.create_farm(&owner(), 9, REWARD, 10),
            Err(AmmError::PoolNotFound { pool_id: 9 })
        );
    }

    #[test]
    fn test_single_staker_earns_full_stream() {
        let mut engine = setup();
        engine.stake_in_farm(&alice(), 1, 500_000).unwrap();

        engine.advance_height(110).unwrap();
        assert_eq!(engine.calculate_rewards(1, &alice()).unwrap(), 1_000);

        let paid = engine.claim_rewards(&alice(), 1).unwrap();
        assert_eq!(paid, 1_000);
        assert_eq!(engine.balance_of(&REWARD, &alice()).unwrap(), 1_000);
        assert_eq!(engine.calculate_rewards(1, &alice()).unwrap(), 0);
        assert_eq!(engine.farm(1).unwrap().reward_balance, 999_000);
    }

    #[test]
    fn test_rewards_split_by_stake() {
        let mut engine = setup();
        engine.stake_in_farm(&alice(), 1, 300_000).unwrap();
        engine.stake_in_farm(&bob(), 1, 100_000).unwrap();

        engine.advance_height(120).unwrap();
        assert_eq!(engine.calculate_rewards(1, &alice()).unwrap(), 1_500);
        assert_eq!(engine.calculate_rewards(1, &bob()).unwrap(), 500);
    }

    #[test]
    fn test_late_staker_gets_no_earlier_rewards() {
        let mut engine = setup();
        engine.stake_in_farm(&alice(), 1, 100_000).unwrap();
        engine.advance_height(110).unwrap();
        engine.stake_in_farm(&bob(), 1, 100_000).unwrap();
        engine.advance_height(120).unwrap();

        // alice: 10 heights alone + half of 10
        assert_eq!(engine.calculate_rewards(1, &alice()).unwrap(), 1_500);
        assert_eq!(engine.calculate_rewards(1, &bob()).unwrap(), 500);
        // The linear estimate prices alice's whole window at today's share
        assert_eq!(engine.linear_reward_estimate(1, &alice()).unwrap(), 1_000);
    }

    #[test]
    fn test_staked_shares_locked_from_withdrawal() {
        let mut engine = setup();
        engine.stake_in_farm(&bob(), 1, 800_000).unwrap();

        let err = engine.remove_liquidity(&bob(), 1, 300_000, 0, 0).unwrap_err();
        assert_eq!(err, AmmError::InsufficientBalance { available: 200_000, requested: 300_000 });

        engine.unstake_from_farm(&bob(), 1, 800_000).unwrap();
        assert!(engine.remove_liquidity(&bob(), 1, 300_000, 0, 0).is_ok());
    }

    #[test]
    fn test_stake_more_than_owned() {
        let mut engine = setup();
        assert_eq!(
            engine.stake_in_farm(&alice(), 1, 1_000_001),
            Err(AmmError::InsufficientBalance { available: 1_000_000, requested: 1_000_001 })
        );
    }

    #[test]
    fn test_claim_capped_by_reward_balance() {
        let mut engine = Engine::with_store_ledger(EngineConfig::new(owner())).unwrap();
        engine.mint(&TOKEN_A, &alice(), 1_000_000).unwrap();
        engine.mint(&TOKEN_B, &alice(), 1_000_000).unwrap();
        engine.mint(&REWARD, &owner(), 50).unwrap();
        engine.create_pool(&alice(), TOKEN_A, TOKEN_B, 1_000_000, 1_000_000).unwrap();
        engine.create_farm(&owner(), 1, REWARD, 10).unwrap();
        engine.fund_farm(&owner(), 1, 50).unwrap();
        engine.stake_in_farm(&alice(), 1, 1_000).unwrap();

        engine.advance_height(10).unwrap();
        assert_eq!(engine.claim_rewards(&alice(), 1).unwrap(), 50);
        // 50 more stay owed
        assert_eq!(engine.calculate_rewards(1, &alice()).unwrap(), 50);
    }

    #[test]
    fn test_missing_farm() {
        let mut engine = setup();
        assert_eq!(engine.stake_in_farm(&alice(), 2, 1), Err(AmmError::FarmNotFound { pool_id: 2 }));
        assert_eq!(engine.calculate_rewards(2, &alice()), Err(AmmError::FarmNotFound { pool_id: 2 }));
    }
}
