//! Engine configuration
//!
//! Hosts hand the engine its configuration as a CBOR document at genesis.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use ledgerswap_common::{
    constants::{
        fees::{DEFAULT_POOL_FEE_BPS, MAX_POOL_FEE_BPS},
        oracle::MAX_TWAP_AGE,
        swap::MAX_HOPS,
    },
    errors::{AmmError, AmmResult},
    types::Address,
};

/// Runtime parameters of an engine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct EngineConfig {
    /// Account allowed to run admin operations and create farms
    pub owner: Address,
    /// Fee rate given to new pools (basis points)
    pub default_fee_bps: u64,
    /// Longest accepted multi-hop path
    pub max_hops: u32,
    /// Heights after which a pool's TWAP is considered stale
    pub twap_max_age: u64,
}

impl EngineConfig {
    /// Configuration with protocol defaults
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            default_fee_bps: DEFAULT_POOL_FEE_BPS,
            max_hops: MAX_HOPS as u32,
            twap_max_age: MAX_TWAP_AGE,
        }
    }

    pub fn validate(&self) -> AmmResult<()> {
        if self.owner == [0u8; 32] {
            return Err(AmmError::InvalidInput {
                param: "owner",
                reason: "owner cannot be zero address",
            });
        }
        if self.default_fee_bps > MAX_POOL_FEE_BPS {
            return Err(AmmError::InvalidInput {
                param: "default_fee_bps",
                reason: "fee rate above maximum",
            });
        }
        if self.max_hops == 0 || self.max_hops as usize > MAX_HOPS {
            return Err(AmmError::InvalidInput {
                param: "max_hops",
                reason: "hop limit out of range",
            });
        }
        Ok(())
    }

    /// Decode and validate a CBOR configuration document
    pub fn from_cbor(bytes: &[u8]) -> AmmResult<Self> {
        let config: Self = ciborium::de::from_reader(bytes).map_err(|_| AmmError::InvalidInput {
            param: "config",
            reason: "malformed CBOR",
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_cbor(&self) -> AmmResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes).map_err(|_| AmmError::InvalidInput {
            param: "config",
            reason: "CBOR encoding failed",
        })?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::new([1u8; 32]);
        assert_eq!(config.default_fee_bps, 30);
        assert_eq!(config.max_hops, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cbor_roundtrip() {
        let mut config = EngineConfig::new([3u8; 32]);
        config.max_hops = 4;

        let bytes = config.to_cbor().unwrap();
        assert_eq!(EngineConfig::from_cbor(&bytes).unwrap(), config);
    }

    #[test]
    fn test_malformed_cbor_rejected() {
        let err = EngineConfig::from_cbor(&[0xff, 0x00, 0x13]).unwrap_err();
        assert_eq!(err.code(), AmmError::InvalidInput { param: "", reason: "" }.code());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = EngineConfig::new([0u8; 32]);
        assert!(config.validate().is_err(), "zero owner");

        config.owner = [1u8; 32];
        config.default_fee_bps = MAX_POOL_FEE_BPS + 1;
        assert!(config.validate().is_err(), "fee too high");

        config.default_fee_bps = 30;
        config.max_hops = 11;
        assert!(config.validate().is_err(), "too many hops");
    }

    #[test]
    fn test_decoded_config_is_validated() {
        let mut config = EngineConfig::new([1u8; 32]);
        config.max_hops = 0;
        let bytes = config.to_cbor().unwrap();
        assert!(EngineConfig::from_cbor(&bytes).is_err());
    }
}
