//! Trait interfaces for the Tidal engine.
//!
//! These traits define the contracts between crates:
//! - [`FungibleLedger`] — raw balance ledger the engine mints and burns through
//!   ([`MemoryLedger`](crate::ledger::MemoryLedger) implements it in memory)
//! - [`RateCalculator`] — per-period rate math (tidal-rate implements)

use crate::constants::{BPS_PRECISION, RATE_PRECISION};
use crate::error::LedgerError;
use crate::fixed::{mul_div, Rate};
use crate::types::Address;

/// Raw fungible-balance ledger consumed by the engine.
///
/// The ledger knows nothing about rates or periods. It only holds balances
/// and the total supply, and reports a `Transfer(from, to, amount)`
/// notification on every net balance movement.
pub trait FungibleLedger: Send + Sync {
    /// Mint `amount` new units to `account`.
    fn credit_supply(&mut self, account: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Burn `amount` units from `account`.
    fn debit_supply(&mut self, account: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Move `amount` units from `from` to `to` without changing supply.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Raw (already settled) balance of `account`. Unknown accounts hold 0.
    fn raw_balance_of(&self, account: &Address) -> u128;

    /// Total units in existence.
    fn total_supply(&self) -> u128;
}

/// Direction and strength of activity relative to the moving average.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    /// Activity equals the average.
    Flat,
    /// Activity above the average; excess in basis points.
    Above(u64),
    /// Activity below the average; shortfall in basis points.
    Below(u64),
}

/// Inputs to a single period's rate computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivitySample {
    /// Transactions in the period that just closed.
    pub tx_count: u64,
    /// Descaled moving average the period is compared against.
    pub average: u64,
    /// Ledger total supply at the rebase.
    pub total_supply: u128,
}

impl ActivitySample {
    /// `|tx_count - average|`.
    pub fn deviation(&self) -> u64 {
        self.tx_count.abs_diff(self.average)
    }
}

/// Pure computation of per-period supply adjustment rates.
///
/// The rate is a base rate derived from annual mint/burn rates plus an
/// activity-driven swing, clamped by the cost an attacker would pay to fake
/// the activity. Implemented by the rate engine (tidal-rate).
pub trait RateCalculator: Send + Sync {
    /// Per-period mint rate magnitude with no activity adjustment.
    fn base_mint_rate(&self) -> u128;

    /// Per-period burn rate magnitude with no activity adjustment.
    fn base_burn_rate(&self) -> u128;

    /// Classify activity against the average, capped at 3×.
    fn activity_trend(&self, tx_count: u64, average: u64) -> Trend;

    /// Largest swing (in rate units) the sample may move the rate by.
    ///
    /// `None` means unbounded.
    fn swing_bound(&self, sample: &ActivitySample) -> Option<u128>;

    /// Signed rate for a closed period.
    ///
    /// Default implementation: base rate of the trend's direction plus
    /// `base * factor / BPS_PRECISION`, the swing clamped by
    /// [`swing_bound`](Self::swing_bound) before the sign is attached.
    fn period_rate(&self, sample: &ActivitySample) -> Rate {
        let (base, factor_bps, mint) = match self.activity_trend(sample.tx_count, sample.average) {
            Trend::Flat => (self.base_mint_rate(), 0, true),
            Trend::Above(bps) => (self.base_mint_rate(), bps, true),
            Trend::Below(bps) => (self.base_burn_rate(), bps, false),
        };

        let mut swing = mul_div(base, factor_bps as u128, BPS_PRECISION as u128);
        if let Some(bound) = self.swing_bound(sample) {
            swing = swing.min(bound);
        }

        let magnitude = base.saturating_add(swing);
        if mint {
            Rate::mint(magnitude)
        } else {
            Rate::burn(magnitude)
        }
    }

    /// Fraction of a transfer burned under `rate`, after `damping`.
    ///
    /// Zero for non-negative rates; never more than `amount`.
    fn transfer_burn(&self, rate: Rate, amount: u128, damping: u64) -> u128 {
        if !rate.is_burn() {
            return 0;
        }
        let denominator = RATE_PRECISION.saturating_mul(damping.max(1) as u128);
        mul_div(amount, rate.magnitude(), denominator).min(amount)
    }
}
