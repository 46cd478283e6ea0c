//! Protocol Events for LedgerSwap
//!
//! Events are emitted during engine execution and can be indexed off-chain
//! for building UIs, analytics, and notifications. The log lives in the store
//! so events from an aborted operation disappear with its writes.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::{Address, LoanId, PoolId, SwapDirection, TokenId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Pool Events (0x01 - 0x1F)
    PoolCreated = 0x01,
    LiquidityAdded = 0x02,
    LiquidityRemoved = 0x03,

    // Swap Events (0x20 - 0x3F)
    Swap = 0x20,
    MultiHopSwap = 0x21,

    // Flash Loan Events (0x40 - 0x5F)
    FlashLoanIssued = 0x40,
    FlashLoanRepaid = 0x41,
    FlashLoanVerified = 0x42,

    // Farm Events (0x60 - 0x7F)
    FarmCreated = 0x60,
    FarmFunded = 0x61,
    FarmStaked = 0x62,
    FarmUnstaked = 0x63,
    RewardsClaimed = 0x64,

    // Governance Events (0x80 - 0x9F)
    GovernanceStaked = 0x80,
    GovernanceDelegated = 0x81,

    // Admin Events (0xA0 - 0xBF)
    GovernanceTokenSet = 0xA0,
    EmergencyShutdownSet = 0xA1,
    ProtocolFeeRateSet = 0xA2,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AmmEvent {
    // ============ Pool Events ============

    /// Emitted when a pool is created
    PoolCreated {
        pool_id: PoolId,
        creator: Address,
        token_x: TokenId,
        token_y: TokenId,
        reserve_x: u64,
        reserve_y: u64,
        shares: u64,
        block_height: u64,
    },

    /// Emitted when liquidity is deposited
    LiquidityAdded {
        pool_id: PoolId,
        provider: Address,
        amount_x: u64,
        amount_y: u64,
        shares: u64,
        block_height: u64,
    },

    /// Emitted when LP shares are burned for reserves
    LiquidityRemoved {
        pool_id: PoolId,
        provider: Address,
        shares: u64,
        amount_x: u64,
        amount_y: u64,
        block_height: u64,
    },

    // ============ Swap Events ============

    /// Emitted for every executed hop
    Swap {
        pool_id: PoolId,
        trader: Address,
        direction: SwapDirection,
        amount_in: u64,
        amount_out: u64,
        fee: u64,
        block_height: u64,
    },

    /// Emitted once a routed swap completes
    MultiHopSwap {
        trader: Address,
        hops: u32,
        amount_in: u64,
        amount_out: u64,
        block_height: u64,
    },

    // ============ Flash Loan Events ============

    /// Emitted when a loan leaves the pool
    FlashLoanIssued {
        loan_id: LoanId,
        pool_id: PoolId,
        borrower: Address,
        token: TokenId,
        amount: u64,
        fee: u64,
        due_height: u64,
    },

    /// Emitted for each repayment made by the callback
    FlashLoanRepaid {
        loan_id: LoanId,
        amount: u64,
        total_repaid: u64,
    },

    /// Emitted when repayment has been checked
    FlashLoanVerified {
        loan_id: LoanId,
        pool_id: PoolId,
        fee: u64,
        block_height: u64,
    },

    // ============ Farm Events ============

    /// Emitted when a farm is attached to a pool
    FarmCreated {
        pool_id: PoolId,
        reward_token: TokenId,
        reward_per_height: u64,
        block_height: u64,
    },

    /// Emitted when reward tokens are added to a farm
    FarmFunded {
        pool_id: PoolId,
        funder: Address,
        amount: u64,
        reward_balance: u64,
    },

    /// Emitted when LP shares are staked
    FarmStaked {
        pool_id: PoolId,
        staker: Address,
        amount: u64,
        total_staked: u64,
        block_height: u64,
    },

    /// Emitted when LP shares are unstaked
    FarmUnstaked {
        pool_id: PoolId,
        staker: Address,
        amount: u64,
        total_staked: u64,
        block_height: u64,
    },

    /// Emitted when farm rewards are paid
    RewardsClaimed {
        pool_id: PoolId,
        staker: Address,
        amount: u64,
        remaining: u64,
        block_height: u64,
    },

    // ============ Governance Events ============

    /// Emitted on every governance stake
    GovernanceStaked {
        staker: Address,
        amount: u64,
        power_added: u64,
        total_power: u64,
        lock_until_height: u64,
    },

    /// Emitted when delegation changes
    GovernanceDelegated {
        staker: Address,
        delegate: Option<Address>,
        block_height: u64,
    },

    // ============ Admin Events ============

    /// Emitted when the governance token is registered
    GovernanceTokenSet {
        token: TokenId,
        block_height: u64,
    },

    /// Emitted when emergency shutdown is toggled
    EmergencyShutdownSet {
        enabled: bool,
        block_height: u64,
    },

    /// Emitted when the protocol fee rate changes
    ProtocolFeeRateSet {
        old_rate_bps: u64,
        new_rate_bps: u64,
        block_height: u64,
    },
}

impl AmmEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PoolCreated { .. } => EventType::PoolCreated,
            Self::LiquidityAdded { .. } => EventType::LiquidityAdded,
            Self::LiquidityRemoved { .. } => EventType::LiquidityRemoved,
            Self::Swap { .. } => EventType::Swap,
            Self::MultiHopSwap { .. } => EventType::MultiHopSwap,
            Self::FlashLoanIssued { .. } => EventType::FlashLoanIssued,
            Self::FlashLoanRepaid { .. } => EventType::FlashLoanRepaid,
            Self::FlashLoanVerified { .. } => EventType::FlashLoanVerified,
            Self::FarmCreated { .. } => EventType::FarmCreated,
            Self::FarmFunded { .. } => EventType::FarmFunded,
            Self::FarmStaked { .. } => EventType::FarmStaked,
            Self::FarmUnstaked { .. } => EventType::FarmUnstaked,
            Self::RewardsClaimed { .. } => EventType::RewardsClaimed,
            Self::GovernanceStaked { .. } => EventType::GovernanceStaked,
            Self::GovernanceDelegated { .. } => EventType::GovernanceDelegated,
            Self::GovernanceTokenSet { .. } => EventType::GovernanceTokenSet,
            Self::EmergencyShutdownSet { .. } => EventType::EmergencyShutdownSet,
            Self::ProtocolFeeRateSet { .. } => EventType::ProtocolFeeRateSet,
        }
    }

    /// Pool the event concerns, if any
    pub fn pool_id(&self) -> Option<PoolId> {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::LiquidityAdded { pool_id, .. }
            | Self::LiquidityRemoved { pool_id, .. }
            | Self::Swap { pool_id, .. }
            | Self::FlashLoanIssued { pool_id, .. }
            | Self::FlashLoanVerified { pool_id, .. }
            | Self::FarmCreated { pool_id, .. }
            | Self::FarmFunded { pool_id, .. }
            | Self::FarmStaked { pool_id, .. }
            | Self::FarmUnstaked { pool_id, .. }
            | Self::RewardsClaimed { pool_id, .. } => Some(*pool_id),
            _ => None,
        }
    }

    /// Serialize event to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<AmmEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: AmmEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[AmmEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<AmmEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&AmmEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Drop every event after the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }
}
