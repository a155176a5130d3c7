//! Tidal simulation binary.
//!
//! Loads a stabilizer configuration, drives a seeded population of holders
//! through the bootstrap and dynamic phases, and prints a JSON report of
//! every closed period plus the final engine snapshot.

mod sim;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tidal_engine::{Stabilizer, StabilizerConfig};
use tracing::info;

use crate::sim::SimConfig;

/// Tidal stabilizer simulator.
#[derive(Parser, Debug)]
#[command(
    name = "tidal-sim",
    version,
    about = "Seeded simulation of the Tidal supply stabilizer"
)]
struct Args {
    /// Stabilizer configuration file (TOML). Defaults to
    /// `<config_dir>/tidal/tidal.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulated holders
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(1..))]
    accounts: u8,

    /// Number of periods to simulate
    #[arg(long, default_value_t = 180)]
    periods: u64,

    /// Mean transfers per period
    #[arg(long, default_value_t = 25)]
    tx_per_period: u64,

    /// Chance that a holder claims the faucet in a bootstrap period
    #[arg(long, default_value_t = 0.5)]
    claim_probability: f64,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Genesis timestamp
    #[arg(long, default_value_t = 0)]
    origin: u64,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            accounts: self.accounts,
            periods: self.periods,
            tx_per_period: self.tx_per_period,
            claim_probability: self.claim_probability,
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, &args.log_format);

    info!("Tidal simulator v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().or_else(default_config_path);
    let config = StabilizerConfig::load(config_path.as_deref())
        .with_context(|| format!("failed to load configuration from {config_path:?}"))?;
    info!("config: {:?}", config_path);
    info!("period_length_secs: {}", config.period_length_secs);
    info!("bootstrap_duration_periods: {}", config.bootstrap_duration_periods);
    info!("seed: {}", args.seed);

    let mut engine = Stabilizer::with_memory_ledger(config, args.origin)
        .context("invalid stabilizer configuration")?;
    let report = sim::run(&mut engine, &args.sim_config())?;

    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// `<config_dir>/tidal/tidal.toml` if it exists.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("tidal").join("tidal.toml"))
        .filter(|path| path.exists())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so the report on stdout stays machine-readable.
/// Pass `format = "json"` for structured JSON output.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
