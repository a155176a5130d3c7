//! Period clock.
//!
//! Maps wall-clock time to a monotonically increasing period index:
//! `period = (now - origin) / period_length`. The clock holds no mutable
//! pointer of its own; the authoritative position is the engine's
//! `last_rebase_time`.

use serde::{Deserialize, Serialize};
use tidal_core::error::StabilizerError;
use tidal_core::types::Phase;

/// Period arithmetic and phase-transition timing.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodClock {
    origin: u64,
    period_length: u64,
    bootstrap_start: u64,
    bootstrap_duration: u64,
}

impl PeriodClock {
    /// Clock starting at `origin` with the bootstrap phase lasting
    /// `bootstrap_periods` periods. A zero `period_length` is treated as 1.
    pub fn new(origin: u64, period_length: u64, bootstrap_periods: u64) -> Self {
        let period_length = period_length.max(1);
        Self {
            origin,
            period_length,
            bootstrap_start: origin,
            bootstrap_duration: bootstrap_periods.saturating_mul(period_length),
        }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn period_length(&self) -> u64 {
        self.period_length
    }

    pub fn bootstrap_start(&self) -> u64 {
        self.bootstrap_start
    }

    /// First timestamp at which a rebase may flip the phase to dynamic.
    pub fn bootstrap_end(&self) -> u64 {
        self.bootstrap_start.saturating_add(self.bootstrap_duration)
    }

    /// Period index containing `now`.
    ///
    /// # Errors
    ///
    /// [`StabilizerError::InvalidTimestamp`] if `now` precedes the origin.
    pub fn current_period(&self, now: u64) -> Result<u64, StabilizerError> {
        now.checked_sub(self.origin)
            .map(|elapsed| elapsed / self.period_length)
            .ok_or(StabilizerError::InvalidTimestamp { now, origin: self.origin })
    }

    /// Timestamp at which `period` begins.
    pub fn period_start(&self, period: u64) -> u64 {
        self.origin
            .saturating_add(period.saturating_mul(self.period_length))
    }

    /// Whether a full period has elapsed since `last_rebase`.
    pub fn is_rebase_due(&self, last_rebase: u64, now: u64) -> bool {
        now >= self.next_rebase_timestamp(last_rebase)
    }

    /// Earliest timestamp at which the next rebase succeeds.
    pub fn next_rebase_timestamp(&self, last_rebase: u64) -> u64 {
        last_rebase.saturating_add(self.period_length)
    }

    /// Whether a rebase at `now` moves `phase` from bootstrap to dynamic.
    pub fn should_enter_dynamic(&self, phase: Phase, now: u64) -> bool {
        phase == Phase::Bootstrap && now >= self.bootstrap_end()
    }

    /// Whole periods since the bootstrap started, floored at 1.
    pub fn days_since_bootstrap(&self, now: u64) -> u64 {
        (now.saturating_sub(self.bootstrap_start) / self.period_length).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAY: u64 = 86_400;

    fn clock() -> PeriodClock {
        PeriodClock::new(1_000, DAY, 90)
    }

    #[test]
    fn period_zero_at_origin() {
        assert_eq!(clock().current_period(1_000).unwrap(), 0);
        assert_eq!(clock().current_period(1_000 + DAY - 1).unwrap(), 0);
    }

    #[test]
    fn period_advances_on_boundary() {
        assert_eq!(clock().current_period(1_000 + DAY).unwrap(), 1);
        assert_eq!(clock().current_period(1_000 + 10 * DAY + 5).unwrap(), 10);
    }

    #[test]
    fn before_origin_is_error() {
        assert_eq!(
            clock().current_period(999),
            Err(StabilizerError::InvalidTimestamp { now: 999, origin: 1_000 })
        );
    }

    #[test]
    fn period_start_inverts_current_period() {
        let c = clock();
        assert_eq!(c.period_start(3), 1_000 + 3 * DAY);
        assert_eq!(c.current_period(c.period_start(3)).unwrap(), 3);
    }

    #[test]
    fn rebase_due_after_full_period() {
        let c = clock();
        assert!(!c.is_rebase_due(1_000, 1_000 + DAY - 1));
        assert!(c.is_rebase_due(1_000, 1_000 + DAY));
        assert_eq!(c.next_rebase_timestamp(1_000), 1_000 + DAY);
    }

    #[test]
    fn dynamic_only_after_bootstrap_duration() {
        let c = clock();
        assert!(!c.should_enter_dynamic(Phase::Bootstrap, 1_000 + 90 * DAY - 1));
        assert!(c.should_enter_dynamic(Phase::Bootstrap, 1_000 + 90 * DAY));
        assert!(!c.should_enter_dynamic(Phase::Dynamic, 1_000 + 200 * DAY));
    }

    #[test]
    fn days_floor_at_one() {
        let c = clock();
        assert_eq!(c.days_since_bootstrap(1_000), 1);
        assert_eq!(c.days_since_bootstrap(1_000 + DAY), 1);
        assert_eq!(c.days_since_bootstrap(1_000 + 2 * DAY), 2);
        assert_eq!(c.days_since_bootstrap(0), 1);
    }

    #[test]
    fn zero_period_length_is_clamped() {
        let c = PeriodClock::new(0, 0, 5);
        assert_eq!(c.period_length(), 1);
        assert_eq!(c.bootstrap_end(), 5);
    }

    proptest! {
        #[test]
        fn period_monotonic(a in 1_000u64..u32::MAX as u64, b in 1_000u64..u32::MAX as u64) {
            let c = clock();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(c.current_period(lo).unwrap() <= c.current_period(hi).unwrap());
        }
    }
}
