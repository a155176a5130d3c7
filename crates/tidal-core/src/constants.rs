//! Protocol constants. All monetary values in base units (1 TIDE = 10^18 units).

pub const TOKEN: u128 = 1_000_000_000_000_000_000;

/// Basis-point denominator: `10_000` means 1.0×.
pub const BPS_PRECISION: u64 = 10_000;

/// Fixed-point denominator for [`Rate`](crate::fixed::Rate) values.
///
/// A rate of `RATE_PRECISION` is 100%. One basis point is
/// [`RATE_UNITS_PER_BPS`] units, which keeps per-period rates derived from
/// annual basis-point rates from truncating to zero.
pub const RATE_PRECISION: u128 = 10_000_000_000;

/// Rate units per basis point.
///
/// # Examples
///
/// ```
/// use tidal_core::constants::{RATE_UNITS_PER_BPS, RATE_PRECISION, BPS_PRECISION};
/// assert_eq!(RATE_UNITS_PER_BPS * BPS_PRECISION as u128, RATE_PRECISION);
/// ```
pub const RATE_UNITS_PER_BPS: u128 = RATE_PRECISION / BPS_PRECISION as u128;

/// Fixed-point denominator for [`Fixed`](crate::fixed::Fixed) values such as
/// the moving-average transaction count.
pub const FIXED_SCALE: u128 = 1_000_000;

pub const DEFAULT_PERIOD_LENGTH_SECS: u64 = 86_400;
pub const DEFAULT_YEAR_LENGTH_SECS: u64 = 365 * DEFAULT_PERIOD_LENGTH_SECS;
pub const DEFAULT_BOOTSTRAP_PERIODS: u64 = 90;
pub const DEFAULT_MOVING_AVERAGE_WINDOW: u64 = 100;
pub const DEFAULT_ANNUAL_MINT_RATE_BPS: u64 = 1_000;
pub const DEFAULT_ANNUAL_BURN_RATE_BPS: u64 = 1_000;
pub const DEFAULT_DROP_AMOUNT: u128 = 1_000 * TOKEN;

/// Cap on the activity ratio `tx / average` (or its inverse): 3×.
pub const MAX_ACTIVITY_RATIO_BPS: u64 = 3 * BPS_PRECISION;

/// Largest activity factor magnitude: 200% excess over the base rate.
pub const MAX_ACTIVITY_FACTOR_BPS: u64 = MAX_ACTIVITY_RATIO_BPS - BPS_PRECISION;

/// Additive constant in the premium denominator `days^2 + PREMIUM_DENOMINATOR_OFFSET`.
pub const PREMIUM_DENOMINATOR_OFFSET: u64 = 2;

/// Extra divisor applied to the burn rate on transfers so the burn stays a
/// small commission rather than the full period rate.
pub const DEFAULT_BURN_DAMPING: u64 = 10;

/// Minimal transaction cost in gas units.
pub const MIN_TX_GAS: u128 = 21_000;

/// Reference gas price in base units (20 gwei).
pub const REFERENCE_GAS_PRICE: u128 = 20_000_000_000;

/// Cost of one transaction to an attacker inflating activity, in base units.
///
/// Small against large supplies: on 10^6 tokens it bounds the swing to about
/// four rate units per transaction of deviation.
pub const DEFAULT_MANIPULATION_COST_PER_TX: u128 = MIN_TX_GAS * REFERENCE_GAS_PRICE;
