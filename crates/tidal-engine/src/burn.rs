//! Burn-on-transfer.
//!
//! While the engine is dynamic and the current rate is a burn, each transfer
//! pays `amount * |rate| / (RATE_PRECISION * damping)` before the net amount
//! moves. The burn never exceeds the amount.

use tidal_core::fixed::Rate;
use tidal_core::traits::RateCalculator;
use tidal_core::types::Phase;

/// Applies the transfer commission derived from the current rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurnApplier {
    damping: u64,
}

impl BurnApplier {
    /// Applier dividing the rate by `damping` (treated as at least 1).
    pub fn new(damping: u64) -> Self {
        Self {
            damping: damping.max(1),
        }
    }

    pub fn damping(&self) -> u64 {
        self.damping
    }

    /// Units burned from a transfer of `amount`.
    pub fn burn_for(
        &self,
        calc: &dyn RateCalculator,
        phase: Phase,
        rate: Rate,
        amount: u128,
    ) -> u128 {
        if phase != Phase::Dynamic {
            return 0;
        }
        calc.transfer_burn(rate, amount, self.damping)
    }
}
