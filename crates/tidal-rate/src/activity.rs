//! Per-period transaction counting and the moving average.
//!
//! The average is an exponential moving average with weight `1/N`:
//!
//! ```text
//! avg' = avg == 0 ? sample : (avg * (N - 1) + sample) / N
//! ```
//!
//! kept in [`Fixed`] so small counts do not truncate to zero. Division
//! truncates toward zero.

use tidal_core::fixed::Fixed;
use tidal_core::types::GlobalState;

/// Activity counters over a [`GlobalState`], parameterized by the window `N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityTracker {
    window: u64,
}

impl ActivityTracker {
    /// Tracker with averaging window `window` (treated as at least 1).
    pub fn new(window: u64) -> Self {
        Self { window: window.max(1) }
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// Count one state-changing operation in the open period.
    pub fn record_transaction(&self, state: &mut GlobalState) {
        state.current_period_tx_count = state.current_period_tx_count.saturating_add(1);
    }

    /// Archive the open period's count as the previous count and reset the
    /// counter. Returns the archived count.
    pub fn roll_over(&self, state: &mut GlobalState) -> u64 {
        state.previous_period_tx_count = state.current_period_tx_count;
        state.current_period_tx_count = 0;
        state.previous_period_tx_count
    }

    /// Fold `sample` into the stored moving average and return the new value.
    pub fn absorb(&self, state: &mut GlobalState, sample: u64) -> Fixed {
        state.moving_average_tx_count = self.next_average(state.moving_average_tx_count, sample);
        state.moving_average_tx_count
    }

    /// Moving average after one more sample. The first sample seeds it.
    pub fn next_average(&self, average: Fixed, sample: u64) -> Fixed {
        if average.is_zero() {
            return Fixed::from_int(sample);
        }
        average
            .saturating_mul_int(self.window - 1)
            .saturating_add(Fixed::from_int(sample))
            .checked_div_int(self.window)
            .unwrap_or(Fixed::ZERO)
    }

    /// Descaled moving average used by the rate calculator.
    pub fn descaled_average(&self, state: &GlobalState) -> u64 {
        state.moving_average_tx_count.to_int()
    }
}
