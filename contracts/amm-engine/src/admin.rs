//! Owner-only administration and protocol-wide queries
//!
//! Admin operations keep working during emergency shutdown so the owner can
//! lift it.

use ledgerswap_common::{
    constants::{fees::MAX_POOL_FEE_BPS, flash::FLASH_LOAN_FEE_BPS},
    errors::{AmmError, AmmResult},
    events::AmmEvent,
    store::{ScalarKey, StoreKey},
    token_ops::TokenLedger,
    types::{Address, TokenId},
};

use crate::Engine;

impl<L: TokenLedger> Engine<L> {
    /// Register the token accepted by governance staking
    pub fn set_governance_token(&mut self, caller: &Address, token: TokenId) -> AmmResult<()> {
        self.ensure_owner(caller)?;
        self.atomic(|engine| {
            engine
                .store
                .put(&StoreKey::Scalar(ScalarKey::GovernanceToken), &token)?;
            engine.emit(AmmEvent::GovernanceTokenSet {
                token,
                block_height: engine.height,
            });
            Ok(())
        })
    }

    pub fn set_emergency_shutdown(&mut self, caller: &Address, enabled: bool) -> AmmResult<()> {
        self.ensure_owner(caller)?;
        self.atomic(|engine| {
            engine
                .store
                .put(&StoreKey::Scalar(ScalarKey::EmergencyShutdown), &enabled)?;
            engine.emit(AmmEvent::EmergencyShutdownSet {
                enabled,
                block_height: engine.height,
            });
            Ok(())
        })
    }

    /// Set the flash-loan fee in basis points
    pub fn set_protocol_fee_rate(&mut self, caller: &Address, rate_bps: u64) -> AmmResult<()> {
        self.ensure_owner(caller)?;
        if rate_bps > MAX_POOL_FEE_BPS {
            return Err(AmmError::InvalidInput {
                param: "rate_bps",
                reason: "fee rate above maximum",
            });
        }
        self.atomic(|engine| {
            let old_rate_bps = engine.protocol_fee_rate()?;
            engine
                .store
                .put(&StoreKey::Scalar(ScalarKey::ProtocolFeeRate), &rate_bps)?;
            engine.emit(AmmEvent::ProtocolFeeRateSet {
                old_rate_bps,
                new_rate_bps: rate_bps,
                block_height: engine.height,
            });
            Ok(())
        })
    }

    // ============ Queries ============

    /// Fees credited to the treasury across all pools
    pub fn total_fees_collected(&self) -> AmmResult<u64> {
        self.store.scalar_u64(ScalarKey::TotalFeesCollected, 0)
    }

    pub fn protocol_fee_rate(&self) -> AmmResult<u64> {
        self.store.scalar_u64(ScalarKey::ProtocolFeeRate, FLASH_LOAN_FEE_BPS)
    }

    pub fn is_shutdown(&self) -> AmmResult<bool> {
        self.store.flag(ScalarKey::EmergencyShutdown)
    }
}
