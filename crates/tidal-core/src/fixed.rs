//! Fixed-point arithmetic.
//!
//! Every division truncates toward zero. Multiplications saturate instead
//! of wrapping, so an intermediate product that exceeds `u128` yields the
//! largest representable value rather than a corrupted one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{FIXED_SCALE, RATE_PRECISION, RATE_UNITS_PER_BPS};

/// Compute `a * b / c` with truncation, saturating at `u128::MAX`.
///
/// The product is formed in 256 bits, so the result is exact whenever the
/// quotient fits in `u128`. Returns 0 when `c` is zero.
///
/// # Examples
///
/// ```
/// use tidal_core::fixed::mul_div;
/// assert_eq!(mul_div(10, 3, 4), 7);
/// assert_eq!(mul_div(u128::MAX, 2, 2), u128::MAX);
/// ```
pub fn mul_div(a: u128, b: u128, c: u128) -> u128 {
    if c == 0 {
        return 0;
    }
    if let Some(product) = a.checked_mul(b) {
        return product / c;
    }
    let (hi, lo) = widening_mul(a, b);
    if hi >= c {
        return u128::MAX;
    }
    // Restoring long division of the 256-bit product; `rem < c` throughout.
    let mut rem = hi;
    let mut quotient: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= c {
            rem = rem.wrapping_sub(c);
            quotient |= 1;
        }
    }
    quotient
}

/// Full 256-bit product as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (ll & MASK) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Unsigned fixed-point number with [`FIXED_SCALE`] as denominator.
///
/// Used for smoothed quantities (the moving-average transaction count)
/// that would otherwise truncate to zero for small counts.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct Fixed(u128);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(FIXED_SCALE);

    /// Wrap a raw scaled value.
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw scaled value.
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Convert an integer to fixed-point.
    pub fn from_int(value: u64) -> Self {
        Self((value as u128).saturating_mul(FIXED_SCALE))
    }

    /// Integer part, truncated toward zero and saturated at `u64::MAX`.
    pub fn to_int(self) -> u64 {
        u64::try_from(self.0 / FIXED_SCALE).unwrap_or(u64::MAX)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_mul_int(self, n: u64) -> Self {
        Self(self.0.saturating_mul(n as u128))
    }

    /// Divide by an integer. Returns `None` on a zero divisor.
    pub fn checked_div_int(self, n: u64) -> Option<Self> {
        self.0.checked_div(n as u128).map(Self)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / FIXED_SCALE, self.0 % FIXED_SCALE)
    }
}

/// Signed per-period supply adjustment rate.
///
/// Positive values mint, negative values burn. The denominator is
/// [`RATE_PRECISION`], so `Rate::from_raw(RATE_PRECISION as i128)` is +100%.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct Rate(i128);

impl Rate {
    pub const ZERO: Self = Self(0);

    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Rate of `bps` basis points.
    pub fn from_bps(bps: i64) -> Self {
        Self((bps as i128).saturating_mul(RATE_UNITS_PER_BPS as i128))
    }

    /// Positive (mint) rate with the given magnitude, saturating at `i128::MAX`.
    pub fn mint(magnitude: u128) -> Self {
        Self(i128::try_from(magnitude).unwrap_or(i128::MAX))
    }

    /// Negative (burn) rate with the given magnitude, saturating at `-i128::MAX`.
    pub fn burn(magnitude: u128) -> Self {
        Self(-i128::try_from(magnitude).unwrap_or(i128::MAX))
    }

    pub fn is_mint(self) -> bool {
        self.0 > 0
    }

    pub fn is_burn(self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Absolute value in rate units.
    pub fn magnitude(self) -> u128 {
        self.0.unsigned_abs()
    }

    /// Whole basis points, truncated toward zero.
    pub fn as_bps(self) -> i128 {
        self.0 / RATE_UNITS_PER_BPS as i128
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// `self - other`, floored at zero. Used for accumulator deltas.
    pub fn saturating_delta(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(0))
    }

    /// `amount * |rate|`, truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidal_core::fixed::Rate;
    /// assert_eq!(Rate::from_bps(100).apply(10_000), 100);
    /// assert_eq!(Rate::from_bps(-100).apply(10_000), 100);
    /// ```
    pub fn apply(self, amount: u128) -> u128 {
        mul_div(amount, self.magnitude(), RATE_PRECISION)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let mag = self.magnitude();
        write!(
            f,
            "{sign}{}.{:06}bps",
            mag / RATE_UNITS_PER_BPS,
            mag % RATE_UNITS_PER_BPS
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // --- mul_div ---

    #[test]
    fn mul_div_truncates() {
        assert_eq!(mul_div(7, 1, 2), 3);
        assert_eq!(mul_div(1, 1, 3), 0);
    }

    #[test]
    fn mul_div_zero_divisor() {
        assert_eq!(mul_div(7, 3, 0), 0);
    }

    #[test]
    fn mul_div_survives_wide_product() {
        let a = u128::MAX / 3;
        assert_eq!(mul_div(a, 6, 6), a);
        assert_eq!(mul_div(a, 4, 8), a / 2);
    }

    #[test]
    fn widening_mul_splits_halves() {
        assert_eq!(widening_mul(u128::MAX, 2), (1, u128::MAX - 1));
        assert_eq!(widening_mul(1 << 64, 1 << 64), (1, 0));
    }

    #[test]
    fn mul_div_saturates() {
        assert_eq!(mul_div(u128::MAX, u128::MAX, 1), u128::MAX);
    }

    // --- Fixed ---

    #[test]
    fn fixed_round_trips_integers() {
        assert_eq!(Fixed::from_int(20).to_int(), 20);
        assert_eq!(Fixed::from_int(0), Fixed::ZERO);
    }

    #[test]
    fn fixed_keeps_fraction_below_one() {
        let third = Fixed::ONE.checked_div_int(3).unwrap();
        assert!(!third.is_zero());
        assert_eq!(third.to_int(), 0);
        assert_eq!(third.to_string(), "0.333333");
    }

    #[test]
    fn fixed_div_by_zero_is_none() {
        assert_eq!(Fixed::ONE.checked_div_int(0), None);
    }

    // --- Rate ---

    #[test]
    fn rate_sign_helpers() {
        assert!(Rate::mint(5).is_mint());
        assert!(Rate::burn(5).is_burn());
        assert!(Rate::ZERO.is_zero());
        assert_eq!(Rate::burn(5).magnitude(), 5);
    }

    #[test]
    fn rate_display() {
        assert_eq!(Rate::from_bps(-27).to_string(), "-27.000000bps");
        assert_eq!(Rate::from_raw(2_739_726).to_string(), "2.739726bps");
    }

    #[test]
    fn rate_delta_floors_at_zero() {
        let a = Rate::from_bps(3);
        let b = Rate::from_bps(5);
        assert_eq!(a.saturating_delta(b), Rate::ZERO);
        assert_eq!(b.saturating_delta(a), Rate::from_bps(2));
    }

    #[test]
    fn rate_saturates_huge_magnitudes() {
        assert_eq!(Rate::mint(u128::MAX).raw(), i128::MAX);
        assert_eq!(Rate::burn(u128::MAX).raw(), -i128::MAX);
    }

    proptest! {
        #[test]
        fn mul_div_matches_wide_math(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128, c in 1u128..u64::MAX as u128) {
            prop_assert_eq!(mul_div(a, b, c), a * b / c);
        }

        #[test]
        fn apply_never_exceeds_amount_for_sub_unit_rates(amount in 0u128..u64::MAX as u128, raw in 0i128..=RATE_PRECISION as i128) {
            prop_assert!(Rate::from_raw(raw).apply(amount) <= amount);
        }
    }
}
