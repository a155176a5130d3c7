//! Shared helpers for the integration tests.

use tidal_core::types::Address;
use tidal_engine::{Stabilizer, StabilizerConfig};

/// Deterministic address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::from_seed(seed)
}

/// One-second periods, a 365-period year and a 90-period bootstrap.
///
/// The manipulation cost is set high enough that the swing clamp never
/// binds, so rates follow the activity factor alone.
pub fn unit_config() -> StabilizerConfig {
    StabilizerConfig {
        period_length_secs: 1,
        year_length_secs: 365,
        bootstrap_duration_periods: 90,
        manipulation_cost_per_tx: u64::MAX,
        ..StabilizerConfig::default()
    }
}

/// Fresh engine over an in-memory ledger with genesis at `origin`.
pub fn engine_at(config: StabilizerConfig, origin: u64) -> Stabilizer {
    Stabilizer::with_memory_ledger(config, origin).expect("valid test config")
}

/// Faucet drops for accounts `1..=holders` at `now`.
pub fn fund(engine: &mut Stabilizer, holders: u8, now: u64) {
    for seed in 1..=holders {
        engine.mint(&addr(seed), now).expect("bootstrap drop");
    }
}

/// Sum of raw balances over every account the engine knows.
pub fn sum_of_effective(engine: &Stabilizer) -> u128 {
    engine
        .snapshot()
        .accounts
        .iter()
        .map(|a| a.record.effective_balance)
        .sum()
}

/// Drive a fresh engine into the dynamic phase with `holders` funded
/// accounts. Returns the engine and the timestamp of the flip rebase.
pub fn dynamic_engine(holders: u8) -> (Stabilizer, u64) {
    let config = unit_config();
    let flip = config.bootstrap_duration_periods;
    let mut engine = engine_at(config, 0);
    fund(&mut engine, holders, 0);
    engine.rebase(flip).expect("flip rebase");
    (engine, flip)
}
