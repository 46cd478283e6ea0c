//! Versioned Key-Value Store
//!
//! The single shared store every engine component reads and writes.
//!
//! ## Layout
//!
//! Keys are a one-byte table tag followed by big-endian identifiers, so each
//! table is a contiguous, ordered range. Values are borsh-encoded records.
//!
//! ## Transactions
//!
//! `begin` opens an undo frame; every write inside it records the previous
//! value. `rollback` replays the frame backwards and drops events emitted
//! since `begin`. `commit` of a nested frame hands its undo entries to the
//! parent, so an inner success is still undone if the outer call aborts.
//! Committing the outermost frame bumps the store version.

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::errors::{AmmError, AmmResult};
use crate::events::{AmmEvent, EventLog};
use crate::types::{Address, LoanId, PoolId, TokenId};
use crate::Vec;

// ============ Keys ============

/// Table tags, the first byte of every key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Table {
    Pool = 0x01,
    Position = 0x02,
    FlashLoan = 0x03,
    Farm = 0x04,
    GovernanceStake = 0x05,
    Balance = 0x10,
    Supply = 0x11,
    Scalar = 0xF0,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Pool => "pools",
            Table::Position => "liquidity_positions",
            Table::FlashLoan => "flash_loans",
            Table::Farm => "yield_farms",
            Table::GovernanceStake => "governance_stakes",
            Table::Balance => "token_balances",
            Table::Supply => "token_supplies",
            Table::Scalar => "scalars",
        }
    }
}

/// Process-wide counters and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScalarKey {
    NextPoolId = 0x01,
    NextLoanId = 0x02,
    TotalFeesCollected = 0x03,
    ProtocolFeeRate = 0x04,
    EmergencyShutdown = 0x05,
    GovernanceToken = 0x06,
}

/// Composite key into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Pool(PoolId),
    Position(PoolId, Address),
    FlashLoan(LoanId),
    Farm(PoolId),
    GovernanceStake(Address),
    Balance(TokenId, Address),
    Supply(TokenId),
    Scalar(ScalarKey),
}

impl StoreKey {
    pub fn table(&self) -> Table {
        match self {
            StoreKey::Pool(_) => Table::Pool,
            StoreKey::Position(..) => Table::Position,
            StoreKey::FlashLoan(_) => Table::FlashLoan,
            StoreKey::Farm(_) => Table::Farm,
            StoreKey::GovernanceStake(_) => Table::GovernanceStake,
            StoreKey::Balance(..) => Table::Balance,
            StoreKey::Supply(_) => Table::Supply,
            StoreKey::Scalar(_) => Table::Scalar,
        }
    }

    /// Byte encoding: table tag, then big-endian components
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 32 + 32);
        out.push(self.table() as u8);
        match self {
            StoreKey::Pool(id) | StoreKey::Farm(id) | StoreKey::FlashLoan(id) => {
                out.extend_from_slice(&id.to_be_bytes());
            }
            StoreKey::Position(pool_id, provider) => {
                out.extend_from_slice(&pool_id.to_be_bytes());
                out.extend_from_slice(provider);
            }
            StoreKey::GovernanceStake(staker) => out.extend_from_slice(staker),
            StoreKey::Balance(token, account) => {
                out.extend_from_slice(token);
                out.extend_from_slice(account);
            }
            StoreKey::Supply(token) => out.extend_from_slice(token),
            StoreKey::Scalar(scalar) => out.push(*scalar as u8),
        }
        out
    }
}

// ============ Store ============

/// Undo frame for one open transaction
#[derive(Debug, Clone, Default)]
struct Frame {
    /// (key, value before the write) in write order
    undo: Vec<(Vec<u8>, Option<Vec<u8>>)>,
    /// Event log length when the frame opened
    event_mark: usize,
}

/// Ordered, journaled key-value store
#[derive(Debug, Clone, Default)]
pub struct Store {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    frames: Vec<Frame>,
    version: u64,
    events: EventLog,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed top-level transitions
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Open transaction depth
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn in_transaction(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Read and decode a record
    pub fn get<T: BorshDeserialize>(&self, key: &StoreKey) -> AmmResult<Option<T>> {
        match self.entries.get(&key.encode()) {
            Some(bytes) => borsh::from_slice(bytes)
                .map(Some)
                .map_err(|_| AmmError::StateCorrupted { table: key.table().name() }),
            None => Ok(None),
        }
    }

    /// Encode and write a record
    pub fn put<T: BorshSerialize>(&mut self, key: &StoreKey, value: &T) -> AmmResult<()> {
        let bytes = borsh::to_vec(value)
            .map_err(|_| AmmError::StateCorrupted { table: key.table().name() })?;
        let encoded = key.encode();
        let previous = self.entries.insert(encoded.clone(), bytes);

        match self.frames.last_mut() {
            Some(frame) => frame.undo.push((encoded, previous)),
            None => self.version += 1,
        }
        Ok(())
    }

    /// Decode every record in a table, in key order
    pub fn scan<T: BorshDeserialize>(&self, table: Table) -> AmmResult<Vec<T>> {
        let lower = [table as u8].to_vec();
        let upper = [table as u8 + 1].to_vec();
        self.entries
            .range(lower..upper)
            .map(|(_, bytes)| {
                borsh::from_slice(bytes).map_err(|_| AmmError::StateCorrupted { table: table.name() })
            })
            .collect()
    }

    /// Read a `u64` scalar, falling back to `default` when unset
    pub fn scalar_u64(&self, key: ScalarKey, default: u64) -> AmmResult<u64> {
        Ok(self.get::<u64>(&StoreKey::Scalar(key))?.unwrap_or(default))
    }

    /// Read a boolean flag, unset meaning `false`
    pub fn flag(&self, key: ScalarKey) -> AmmResult<bool> {
        Ok(self.get::<bool>(&StoreKey::Scalar(key))?.unwrap_or(false))
    }

    // ============ Transactions ============

    /// Open a (possibly nested) transaction
    pub fn begin(&mut self) {
        self.frames.push(Frame {
            undo: Vec::new(),
            event_mark: self.events.len(),
        });
    }

    /// Close the innermost transaction, keeping its effects
    pub fn commit(&mut self) -> AmmResult<()> {
        let frame = self.frames.pop().ok_or(AmmError::InvalidInput {
            param: "commit",
            reason: "no open transaction",
        })?;

        match self.frames.last_mut() {
            Some(parent) => parent.undo.extend(frame.undo),
            None => self.version += 1,
        }
        Ok(())
    }

    /// Close the innermost transaction, undoing its effects
    pub fn rollback(&mut self) -> AmmResult<()> {
        let frame = self.frames.pop().ok_or(AmmError::InvalidInput {
            param: "rollback",
            reason: "no open transaction",
        })?;

        for (key, previous) in frame.undo.into_iter().rev() {
            match previous {
                Some(bytes) => {
                    self.entries.insert(key, bytes);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
        self.events.truncate(frame.event_mark);
        Ok(())
    }

    // ============ Events ============

    pub fn emit(&mut self, event: AmmEvent) {
        self.events.emit(event);
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Hand committed events to an indexer and start a fresh log
    pub fn drain_events(&mut self) -> Vec<AmmEvent> {
        core::mem::take(&mut self.events).into_events()
    }
}
