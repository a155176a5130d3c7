//! Rate engine implementing the [`RateCalculator`] trait.
//!
//! Per-period base rates are derived from annual basis-point rates:
//! `base = annual_bps * period_length / year_length`, carried in rate units
//! (1 bps = 10^6 units) so a one-day period keeps its fractional part.
//! All arithmetic is integer-only with saturating u128 intermediates.

use serde::{Deserialize, Serialize};
use tidal_core::constants::{
    BPS_PRECISION, DEFAULT_ANNUAL_BURN_RATE_BPS, DEFAULT_ANNUAL_MINT_RATE_BPS,
    DEFAULT_MANIPULATION_COST_PER_TX, DEFAULT_PERIOD_LENGTH_SECS, DEFAULT_YEAR_LENGTH_SECS,
    MAX_ACTIVITY_RATIO_BPS, RATE_PRECISION, RATE_UNITS_PER_BPS,
};
use tidal_core::fixed::mul_div;
use tidal_core::traits::{ActivitySample, RateCalculator, Trend};
use tracing::trace;

/// Parameters of the rate engine.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateParams {
    /// Annual mint rate `M` in basis points.
    pub annual_mint_rate_bps: u64,
    /// Annual burn rate `B` in basis points.
    pub annual_burn_rate_bps: u64,
    pub period_length_secs: u64,
    pub year_length_secs: u64,
    /// Cost to an attacker of one extra transaction, in base units.
    pub manipulation_cost_per_tx: u128,
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            annual_mint_rate_bps: DEFAULT_ANNUAL_MINT_RATE_BPS,
            annual_burn_rate_bps: DEFAULT_ANNUAL_BURN_RATE_BPS,
            period_length_secs: DEFAULT_PERIOD_LENGTH_SECS,
            year_length_secs: DEFAULT_YEAR_LENGTH_SECS,
            manipulation_cost_per_tx: DEFAULT_MANIPULATION_COST_PER_TX,
        }
    }
}

/// The production rate calculator.
///
/// Implements [`RateCalculator`] with:
/// - Base rates scaled from annual to per-period
/// - Activity ratio capped at 3× in either direction
/// - Swing clamp `cost_per_tx * |tx - avg| / total_supply`
#[derive(Clone, Debug)]
pub struct RateEngine {
    params: RateParams,
    base_mint: u128,
    base_burn: u128,
}

impl RateEngine {
    pub fn new(params: RateParams) -> Self {
        let base_mint = per_period(params.annual_mint_rate_bps, &params);
        let base_burn = per_period(params.annual_burn_rate_bps, &params);
        trace!(base_mint, base_burn, "derived per-period base rates");
        Self { params, base_mint, base_burn }
    }

    pub fn params(&self) -> &RateParams {
        &self.params
    }
}

impl Default for RateEngine {
    fn default() -> Self {
        Self::new(RateParams::default())
    }
}

/// `annual_bps * period / year` in rate units. Zero year length yields 0.
fn per_period(annual_bps: u64, params: &RateParams) -> u128 {
    let annual = (annual_bps as u128).saturating_mul(RATE_UNITS_PER_BPS);
    mul_div(
        annual,
        params.period_length_secs as u128,
        params.year_length_secs as u128,
    )
}

/// `min(MAX_ACTIVITY_RATIO_BPS, numerator * BPS / denominator)`; a zero
/// denominator maps to the cap.
fn capped_ratio_bps(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return MAX_ACTIVITY_RATIO_BPS;
    }
    let ratio = mul_div(
        numerator as u128,
        BPS_PRECISION as u128,
        denominator as u128,
    );
    ratio.min(MAX_ACTIVITY_RATIO_BPS as u128) as u64
}

impl RateCalculator for RateEngine {
    fn base_mint_rate(&self) -> u128 {
        self.base_mint
    }

    fn base_burn_rate(&self) -> u128 {
        self.base_burn
    }

    fn activity_trend(&self, tx_count: u64, average: u64) -> Trend {
        use std::cmp::Ordering;

        match tx_count.cmp(&average) {
            Ordering::Equal => Trend::Flat,
            Ordering::Greater => Trend::Above(capped_ratio_bps(tx_count, average) - BPS_PRECISION),
            // Zero activity maps to the cap: full burn pressure.
            Ordering::Less => Trend::Below(capped_ratio_bps(average, tx_count) - BPS_PRECISION),
        }
    }

    fn swing_bound(&self, sample: &ActivitySample) -> Option<u128> {
        if sample.total_supply == 0 {
            return None;
        }
        let attack_cost = self
            .params
            .manipulation_cost_per_tx
            .saturating_mul(sample.deviation() as u128);
        Some(mul_div(attack_cost, RATE_PRECISION, sample.total_supply))
    }
}
