//! Engine configuration.
//!
//! Provides [`StabilizerConfig`] with protocol defaults. The configuration
//! can be built programmatically or loaded from a TOML file layered with
//! `TIDAL_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tidal_core::constants::{
    DEFAULT_ANNUAL_BURN_RATE_BPS, DEFAULT_ANNUAL_MINT_RATE_BPS, DEFAULT_BOOTSTRAP_PERIODS,
    DEFAULT_BURN_DAMPING, DEFAULT_DROP_AMOUNT, DEFAULT_MANIPULATION_COST_PER_TX,
    DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_PERIOD_LENGTH_SECS, DEFAULT_YEAR_LENGTH_SECS, TOKEN,
};
use tidal_core::error::ConfigError;
use tidal_rate::RateParams;

/// Configuration for a stabilizer instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Length of one period in seconds.
    pub period_length_secs: u64,
    /// Length of one year in seconds, for annual-to-period rate scaling.
    pub year_length_secs: u64,
    /// Number of periods before the dynamic phase may begin.
    pub bootstrap_duration_periods: u64,
    /// Moving-average window `N`.
    pub moving_average_window: u64,
    /// Annual mint rate in basis points.
    pub annual_mint_rate_bps: u64,
    /// Annual burn rate in basis points.
    pub annual_burn_rate_bps: u64,
    /// Faucet drop before premium, in whole tokens.
    pub drop_amount_tokens: u64,
    /// Cost of one transaction to an attacker, in base units.
    ///
    /// The activity swing is capped at `cost * |tx - avg| / total_supply`.
    /// At the default (21000 gas at 20 gwei) that cap is a few rate units
    /// per transaction once supply reaches about a million tokens, so rates
    /// stay close to the base rate. Raise the cost to let the activity
    /// factor act on large supplies.
    pub manipulation_cost_per_tx: u64,
    /// Divisor applied to the burn rate on transfers.
    pub burn_damping: u64,
    /// Run an overdue rebase at the start of any touching operation.
    pub auto_rebase: bool,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            period_length_secs: DEFAULT_PERIOD_LENGTH_SECS,
            year_length_secs: DEFAULT_YEAR_LENGTH_SECS,
            bootstrap_duration_periods: DEFAULT_BOOTSTRAP_PERIODS,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            annual_mint_rate_bps: DEFAULT_ANNUAL_MINT_RATE_BPS,
            annual_burn_rate_bps: DEFAULT_ANNUAL_BURN_RATE_BPS,
            drop_amount_tokens: (DEFAULT_DROP_AMOUNT / TOKEN) as u64,
            manipulation_cost_per_tx: DEFAULT_MANIPULATION_COST_PER_TX as u64,
            burn_damping: DEFAULT_BURN_DAMPING,
            auto_rebase: true,
        }
    }
}

impl StabilizerConfig {
    /// Load from an optional TOML file, then `TIDAL_*` environment variables.
    ///
    /// Missing keys take their defaults. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("TIDAL").try_parsing(true));

        let cfg: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_length_secs == 0 {
            return Err(ConfigError::Invalid("period_length_secs must be positive".into()));
        }
        if self.year_length_secs < self.period_length_secs {
            return Err(ConfigError::Invalid(
                "year_length_secs must be at least one period".into(),
            ));
        }
        if self.moving_average_window == 0 {
            return Err(ConfigError::Invalid("moving_average_window must be positive".into()));
        }
        if self.burn_damping == 0 {
            return Err(ConfigError::Invalid("burn_damping must be positive".into()));
        }
        Ok(())
    }

    /// Faucet drop before premium, in base units.
    pub fn drop_amount(&self) -> u128 {
        (self.drop_amount_tokens as u128).saturating_mul(TOKEN)
    }

    /// Parameters for the rate engine.
    pub fn rate_params(&self) -> RateParams {
        RateParams {
            annual_mint_rate_bps: self.annual_mint_rate_bps,
            annual_burn_rate_bps: self.annual_burn_rate_bps,
            period_length_secs: self.period_length_secs,
            year_length_secs: self.year_length_secs,
            manipulation_cost_per_tx: self.manipulation_cost_per_tx as u128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        StabilizerConfig::default().validate().unwrap();
    }

    #[test]
    fn default_drop_is_one_thousand_tokens() {
        assert_eq!(StabilizerConfig::default().drop_amount(), 1_000 * TOKEN);
    }

    #[test]
    fn zero_period_rejected() {
        let cfg = StabilizerConfig {
            period_length_secs: 0,
            ..StabilizerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn short_year_rejected() {
        let cfg = StabilizerConfig {
            year_length_secs: 10,
            period_length_secs: 11,
            ..StabilizerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_window_and_damping_rejected() {
        let window = StabilizerConfig {
            moving_average_window: 0,
            ..StabilizerConfig::default()
        };
        let damping = StabilizerConfig {
            burn_damping: 0,
            ..StabilizerConfig::default()
        };
        assert!(window.validate().is_err());
        assert!(damping.validate().is_err());
    }

    #[test]
    fn rate_params_mirror_config() {
        let cfg = StabilizerConfig::default();
        let p = cfg.rate_params();
        assert_eq!(p.annual_mint_rate_bps, cfg.annual_mint_rate_bps);
        assert_eq!(p.period_length_secs, cfg.period_length_secs);
        assert_eq!(p.manipulation_cost_per_tx, cfg.manipulation_cost_per_tx as u128);
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "period_length_secs = 60").unwrap();
        writeln!(file, "year_length_secs = 21900").unwrap();
        writeln!(file, "auto_rebase = false").unwrap();
        let cfg = StabilizerConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.period_length_secs, 60);
        assert_eq!(cfg.year_length_secs, 21_900);
        assert!(!cfg.auto_rebase);
        assert_eq!(cfg.moving_average_window, DEFAULT_MOVING_AVERAGE_WINDOW);
    }

    #[test]
    fn load_rejects_invalid_file_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "burn_damping = 0").unwrap();
        assert!(matches!(
            StabilizerConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_missing_file_is_load_error() {
        let err = StabilizerConfig::load(Some(Path::new("/nonexistent/tidal.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
