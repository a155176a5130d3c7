//! Values returned by engine operations and the exported engine snapshot.

use serde::{Deserialize, Serialize};
use tidal_core::fixed::{Fixed, Rate};
use tidal_core::types::{AccountRecord, Address, GlobalState, PeriodStats, Phase};

/// Summary of a successful rebase.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebaseOutcome {
    /// Index of the period that was closed.
    pub closed_period: u64,
    /// Transactions recorded in the closed period.
    pub tx_count: u64,
    /// Rate computed for the closed period. Zero during bootstrap.
    pub rate: Rate,
    pub moving_average: Fixed,
    /// Phase after the rebase.
    pub phase: Phase,
    /// This rebase flipped the phase to dynamic.
    pub entered_dynamic: bool,
    /// Earliest timestamp of the next rebase.
    pub next_rebase: u64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from: Address,
    pub to: Address,
    /// Amount requested by the caller.
    pub amount: u128,
    /// Units burned from the sender on top of the move.
    pub burned: u128,
    /// Units credited to the recipient.
    pub received: u128,
}

/// Result of a faucet claim.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropReceipt {
    pub account: Address,
    /// Units credited, premium included.
    pub amount: u128,
    pub premium_bps: u64,
    /// Period the claim counts against.
    pub period: u64,
}

/// One account in an [`EngineSnapshot`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Hex address.
    pub address: String,
    pub record: AccountRecord,
    pub raw_balance: u128,
    pub projected_balance: u128,
}

/// Point-in-time export of the engine for reports and debugging.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub global: GlobalState,
    pub total_supply: u128,
    /// Accounts ordered by address.
    pub accounts: Vec<AccountSnapshot>,
    /// Closed periods in index order.
    pub periods: Vec<PeriodStats>,
}

impl EngineSnapshot {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
