//! Early-participation premium.
//!
//! `premium(days) = BPS + BPS / (days^2 + 2)` with `days >= 1`, so the
//! multiplier starts at 1.3333× on day one and approaches 1.0×.

use tidal_core::constants::{BPS_PRECISION, PREMIUM_DENOMINATOR_OFFSET};
use tidal_core::fixed::mul_div;

/// Premium multiplier in basis points for `days` whole periods since the
/// bootstrap began. `days` is floored at 1.
pub fn premium_bps(days: u64) -> u64 {
    let days = days.max(1);
    let denominator = days
        .saturating_mul(days)
        .saturating_add(PREMIUM_DENOMINATOR_OFFSET);
    BPS_PRECISION + BPS_PRECISION / denominator
}

/// `amount * premium / BPS`, truncated.
pub fn apply_premium(amount: u128, premium_bps: u64) -> u128 {
    mul_div(amount, premium_bps as u128, BPS_PRECISION as u128)
}
