//! Core domain types: addresses, phases, period statistics and account records.
//!
//! All monetary values are in base units (1 TIDE = 10^18 units).
//! Timestamps are Unix seconds supplied by the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;
use crate::fixed::{Fixed, Rate};

/// A 20-byte account identity.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Deterministic address from a seed byte. Handy for tests and simulations.
    pub fn from_seed(seed: u8) -> Self {
        Self([seed; 20])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

/// Lifecycle phase of the engine.
///
/// Transitions `Bootstrap -> Dynamic` exactly once, observed at a rebase.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Faucet drops with a decaying premium; no dynamic rate.
    #[default]
    Bootstrap,
    /// Activity-driven mint/burn rates. Terminal.
    Dynamic,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrap => f.write_str("bootstrap"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Statistics for a closed period. Written once at closure.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodStats {
    /// Period index the statistics belong to.
    pub period: u64,
    /// Transactions recorded while the period was open.
    pub tx_count: u64,
    /// Rate computed when the period closed.
    pub rate: Rate,
    /// Moving average after absorbing `tx_count`.
    pub moving_average: Fixed,
    /// Timestamp of the rebase that closed the period.
    pub closed_at: u64,
}

/// Engine-wide state. One instance per engine; never shared implicitly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GlobalState {
    pub phase: Phase,
    /// Timestamp of period 0.
    pub origin: u64,
    /// Start of the bootstrap phase.
    pub bootstrap_start: u64,
    /// Start of the currently open period as of the last rebase.
    pub last_rebase_time: u64,
    /// Timestamp of the last positive rate accrual.
    pub last_rate_update_time: u64,
    /// Cumulative mint rate accrued since genesis.
    pub accumulated_mint_rate: Rate,
    /// Smoothed transaction count.
    pub moving_average_tx_count: Fixed,
    /// Transactions recorded in the open period.
    pub current_period_tx_count: u64,
    /// Transactions recorded in the last closed period.
    pub previous_period_tx_count: u64,
    /// Rate computed at the last rebase.
    pub current_rate: Rate,
}

impl GlobalState {
    /// Genesis state: bootstrap phase, period 0 open at `origin`.
    pub fn genesis(origin: u64) -> Self {
        Self {
            phase: Phase::Bootstrap,
            origin,
            bootstrap_start: origin,
            last_rebase_time: origin,
            last_rate_update_time: origin,
            accumulated_mint_rate: Rate::ZERO,
            moving_average_tx_count: Fixed::ZERO,
            current_period_tx_count: 0,
            previous_period_tx_count: 0,
            current_rate: Rate::ZERO,
        }
    }
}

/// Per-account settlement record. Created on first touch, never deleted.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountRecord {
    /// Timestamp of the last touch.
    pub last_updated: u64,
    /// Timestamp at which the account last pulled global accruals.
    pub last_mint_rate_epoch: u64,
    /// Value of the global accumulator already absorbed by this account.
    pub mint_rate_checkpoint: Rate,
    /// Rate owed to this account and not yet applied.
    pub accumulated_mint_rate: Rate,
    /// Raw ledger balance as of the last touch.
    pub effective_balance: u128,
    /// Period of the last faucet drop, if any.
    pub last_drop_period: Option<u64>,
}

impl AccountRecord {
    /// Fresh record owing nothing: the checkpoint starts at the current
    /// global accumulator.
    pub fn new(now: u64, checkpoint: Rate, balance: u128) -> Self {
        Self {
            last_updated: now,
            last_mint_rate_epoch: now,
            mint_rate_checkpoint: checkpoint,
            accumulated_mint_rate: Rate::ZERO,
            effective_balance: balance,
            last_drop_period: None,
        }
    }
}
