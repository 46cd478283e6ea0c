//! Core Types for LedgerSwap
//!
//! Records persisted in the engine store. Every record is owned by the store;
//! operations read a copy, compute the next value and write it back.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::precision::FEE_GROWTH_SCALE;

/// Type alias for account addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for opaque asset identifiers
pub type TokenId = [u8; 32];

/// Type alias for pool identifiers (monotonic counter)
pub type PoolId = u64;

/// Type alias for flash loan identifiers (monotonic counter)
pub type LoanId = u64;

// ============ Directions ============

/// Which side of a pool a token sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolSide {
    X,
    Y,
}

impl PoolSide {
    pub fn other(self) -> Self {
        match self {
            PoolSide::X => PoolSide::Y,
            PoolSide::Y => PoolSide::X,
        }
    }
}

/// Which reserve receives the input of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum SwapDirection {
    /// Pay token X, receive token Y
    XToY,
    /// Pay token Y, receive token X
    YToX,
}

impl SwapDirection {
    /// Side of the pool the input lands on
    pub fn input_side(self) -> PoolSide {
        match self {
            SwapDirection::XToY => PoolSide::X,
            SwapDirection::YToX => PoolSide::Y,
        }
    }
}

// ============ Pool ============

/// Two-asset reserve pair with an LP share ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Pool {
    /// Pool identifier
    pub id: PoolId,
    /// Asset held on the X side
    pub token_x: TokenId,
    /// Asset held on the Y side
    pub token_y: TokenId,
    pub reserve_x: u64,
    pub reserve_y: u64,
    /// Principal out on open flash loans, still counted in the reserves
    pub lent_x: u64,
    pub lent_y: u64,
    /// Sum of every position's shares
    pub total_lp_supply: u64,
    /// Swap fee in basis points
    pub fee_rate_bps: u64,
    pub created_height: u64,
    pub last_update_height: u64,
    /// Lifetime swap fees collected on each side
    pub cumulative_fee_x: u64,
    pub cumulative_fee_y: u64,
    /// Fees per LP share, scaled by `FEE_GROWTH_SCALE`
    pub fee_growth_x: u128,
    pub fee_growth_y: u128,
    /// Sum of spot price times heights it prevailed
    pub price_cumulative_last: u128,
    /// Height the price accumulators were last folded
    pub price_timestamp: u64,
    /// Moving time-weighted average price of X in Y (`PRICE_PRECISION` scale)
    pub twap: u64,
}

impl Pool {
    /// Reserves ordered as (in, out) for a swap direction
    pub fn reserves_for(&self, direction: SwapDirection) -> (u64, u64) {
        match direction {
            SwapDirection::XToY => (self.reserve_x, self.reserve_y),
            SwapDirection::YToX => (self.reserve_y, self.reserve_x),
        }
    }

    /// Token on a given side
    pub fn token(&self, side: PoolSide) -> TokenId {
        match side {
            PoolSide::X => self.token_x,
            PoolSide::Y => self.token_y,
        }
    }

    /// Reserve on a given side
    pub fn reserve(&self, side: PoolSide) -> u64 {
        match side {
            PoolSide::X => self.reserve_x,
            PoolSide::Y => self.reserve_y,
        }
    }

    /// Mutable reserve on a given side
    pub fn reserve_mut(&mut self, side: PoolSide) -> &mut u64 {
        match side {
            PoolSide::X => &mut self.reserve_x,
            PoolSide::Y => &mut self.reserve_y,
        }
    }

    pub fn lent_mut(&mut self, side: PoolSide) -> &mut u64 {
        match side {
            PoolSide::X => &mut self.lent_x,
            PoolSide::Y => &mut self.lent_y,
        }
    }

    /// Reserve actually held in custody on a given side
    ///
    /// Pricing and share math use the full reserve; only payouts are bounded
    /// by what is on hand while a flash loan is open.
    pub fn available(&self, side: PoolSide) -> u64 {
        match side {
            PoolSide::X => self.reserve_x.saturating_sub(self.lent_x),
            PoolSide::Y => self.reserve_y.saturating_sub(self.lent_y),
        }
    }

    /// Direction of a swap paying `token_in`, if the pool holds it
    pub fn direction_for(&self, token_in: &TokenId) -> Option<SwapDirection> {
        if *token_in == self.token_x {
            Some(SwapDirection::XToY)
        } else if *token_in == self.token_y {
            Some(SwapDirection::YToX)
        } else {
            None
        }
    }

    /// Constant-product invariant `reserve_x * reserve_y`
    pub fn invariant(&self) -> u128 {
        self.reserve_x as u128 * self.reserve_y as u128
    }

    /// Account holding this pool's reserves
    pub fn custody(&self) -> Address {
        custody_address(CustodyDomain::Pool, self.id)
    }
}

// ============ Liquidity Position ============

/// A provider's claim on one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LiquidityPosition {
    pub pool_id: PoolId,
    pub provider: Address,
    /// LP shares owned
    pub shares: u64,
    /// Shares opted into the pool's farm (subset of `shares`)
    pub staked_amount: u64,
    pub last_stake_height: u64,
    /// Pool fee growth at the last settlement
    pub fee_growth_checkpoint_x: u128,
    pub fee_growth_checkpoint_y: u128,
    /// Fees earned since the position was opened, not yet realized
    pub unclaimed_fee_x: u64,
    pub unclaimed_fee_y: u64,
    /// Farm accumulated-reward-per-share at the last settlement
    pub reward_checkpoint: u128,
    /// Farm rewards settled but not yet paid out
    pub unclaimed_rewards: u64,
}

impl LiquidityPosition {
    /// Empty position checkpointed at the pool's current fee growth
    pub fn new(pool: &Pool, provider: Address) -> Self {
        Self {
            pool_id: pool.id,
            provider,
            shares: 0,
            staked_amount: 0,
            last_stake_height: 0,
            fee_growth_checkpoint_x: pool.fee_growth_x,
            fee_growth_checkpoint_y: pool.fee_growth_y,
            unclaimed_fee_x: 0,
            unclaimed_fee_y: 0,
            reward_checkpoint: 0,
            unclaimed_rewards: 0,
        }
    }

    /// Shares not committed to the farm
    pub fn unstaked_shares(&self) -> u64 {
        self.shares.saturating_sub(self.staked_amount)
    }

    /// Fold fee growth since the last checkpoint into unclaimed fees
    pub fn settle_fees(&mut self, pool: &Pool) {
        let earned = |growth: u128, checkpoint: u128| {
            let delta = growth.saturating_sub(checkpoint);
            (self.shares as u128).saturating_mul(delta) / FEE_GROWTH_SCALE
        };
        let fee_x = earned(pool.fee_growth_x, self.fee_growth_checkpoint_x);
        let fee_y = earned(pool.fee_growth_y, self.fee_growth_checkpoint_y);

        self.unclaimed_fee_x = self.unclaimed_fee_x.saturating_add(fee_x.min(u64::MAX as u128) as u64);
        self.unclaimed_fee_y = self.unclaimed_fee_y.saturating_add(fee_y.min(u64::MAX as u128) as u64);
        self.fee_growth_checkpoint_x = pool.fee_growth_x;
        self.fee_growth_checkpoint_y = pool.fee_growth_y;
    }
}

// ============ Flash Loan ============

/// Flash loan lifecycle. A failed loan aborts its transaction, so only these
/// two states are ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum LoanStatus {
    /// Funds sent, callback running
    #[default]
    Issued,
    /// Repayment checked, loan closed
    Verified,
}

/// Same-transaction loan out of a pool's reserves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FlashLoan {
    pub id: LoanId,
    pub pool_id: PoolId,
    pub borrower: Address,
    /// Asset lent
    pub token: TokenId,
    /// Pool side the asset was taken from
    pub side: PoolSide,
    /// Principal
    pub amount: u64,
    /// Fee owed on top of principal
    pub fee: u64,
    /// Amount paid back so far
    pub repaid: u64,
    pub issued_height: u64,
    /// Recorded for indexers; repayment is enforced inside the issuing call
    pub due_height: u64,
    pub status: LoanStatus,
}

impl FlashLoan {
    /// Principal plus fee
    pub fn amount_due(&self) -> u64 {
        self.amount.saturating_add(self.fee)
    }

    /// Principal not yet returned; repayments settle this before the fee
    pub fn outstanding_principal(&self) -> u64 {
        self.amount.saturating_sub(self.repaid)
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Issued
    }
}

// ============ Yield Farm ============

/// Per-pool reward stream for staked LP shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct YieldFarm {
    pub pool_id: PoolId,
    pub reward_token: TokenId,
    /// Reward units emitted per height across all stakers
    pub reward_per_height: u64,
    pub total_staked: u64,
    pub last_reward_height: u64,
    /// Scaled by `REWARD_MULTIPLIER`, never decreases
    pub acc_reward_per_share: u128,
    /// Reward tokens held in farm custody and not yet paid
    pub reward_balance: u64,
    pub total_rewards_paid: u64,
    pub created_height: u64,
}

impl YieldFarm {
    /// Account holding this farm's reward tokens
    pub fn custody(&self) -> Address {
        custody_address(CustodyDomain::Farm, self.pool_id)
    }
}

// ============ Governance Stake ============

/// Governance tokens locked by one staker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct GovernanceStake {
    pub staker: Address,
    /// Tokens staked across all calls
    pub amount: u64,
    /// Power earned across all calls
    pub voting_power: u64,
    /// Overwritten by every stake
    pub lock_until_height: u64,
    /// Account voting on this staker's behalf
    pub delegate: Option<Address>,
    pub last_stake_height: u64,
}

impl GovernanceStake {
    pub fn new(staker: Address) -> Self {
        Self {
            staker,
            amount: 0,
            voting_power: 0,
            lock_until_height: 0,
            delegate: None,
            last_stake_height: 0,
        }
    }
}

// ============ Custody Accounts ============

/// Engine-controlled account families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyDomain {
    Pool,
    Farm,
    GovernanceVault,
}

impl CustodyDomain {
    fn tag(self) -> &'static [u8] {
        match self {
            CustodyDomain::Pool => b"ledgerswap/pool",
            CustodyDomain::Farm => b"ledgerswap/farm",
            CustodyDomain::GovernanceVault => b"ledgerswap/governance",
        }
    }
}

/// Deterministic address for an engine-controlled account
pub fn custody_address(domain: CustodyDomain, id: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(domain.tag());
    hasher.update(id.to_be_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

/// Account holding all staked governance tokens
pub fn governance_vault() -> Address {
    custody_address(CustodyDomain::GovernanceVault, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> Pool {
        Pool {
            id: 7,
            token_x: [1u8; 32],
            token_y: [2u8; 32],
            reserve_x: 1_000,
            reserve_y: 4_000,
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
        }
    }

    #[test]
    fn test_direction_for_token() {
        let pool = sample_pool();
        assert_eq!(pool.direction_for(&[1u8; 32]), Some(SwapDirection::XToY));
        assert_eq!(pool.direction_for(&[2u8; 32]), Some(SwapDirection::YToX));
        assert_eq!(pool.direction_for(&[3u8; 32]), None);
        assert_eq!(pool.reserves_for(SwapDirection::YToX), (4_000, 1_000));
    }

    #[test]
    fn test_available_excludes_lent_principal() {
        let mut pool = sample_pool();
        *pool.lent_mut(PoolSide::X) = 900;
        assert_eq!(pool.available(PoolSide::X), 100);
        assert_eq!(pool.available(PoolSide::Y), 4_000);
        assert_eq!(pool.reserve(PoolSide::X), 1_000);
    }

    #[test]
    fn test_custody_addresses_distinct() {
        let pool = custody_address(CustodyDomain::Pool, 1);
        let farm = custody_address(CustodyDomain::Farm, 1);
        let other_pool = custody_address(CustodyDomain::Pool, 2);
        assert_ne!(pool, farm);
        assert_ne!(pool, other_pool);
        assert_eq!(pool, custody_address(CustodyDomain::Pool, 1));
    }

    #[test]
    fn test_settle_fees_uses_checkpoint() {
        let mut pool = sample_pool();
        let mut position = LiquidityPosition::new(&pool, [9u8; 32]);
        position.shares = 500_000;

        // 3 units of X fee spread over 1M shares
        pool.fee_growth_x = 3 * FEE_GROWTH_SCALE / 1_000_000;
        position.settle_fees(&pool);
        assert_eq!(position.unclaimed_fee_x, 1); // floor(1.5)
        assert_eq!(position.fee_growth_checkpoint_x, pool.fee_growth_x);

        // Settling again without new growth adds nothing
        position.settle_fees(&pool);
        assert_eq!(position.unclaimed_fee_x, 1);
    }
}
