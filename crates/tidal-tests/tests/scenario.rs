//! End-to-end scenarios: genesis through bootstrap into the dynamic phase.
//!
//! Timeline used throughout: one-second periods, a 90-period bootstrap and a
//! 365-period year, so the daily base rate is 1000 bps / 365.

use tidal_core::constants::{BPS_PRECISION, TOKEN};
use tidal_core::error::StabilizerError;
use tidal_core::fixed::{Fixed, Rate};
use tidal_core::traits::RateCalculator;
use tidal_core::types::Phase;
use tidal_engine::{SharedStabilizer, StabilizerConfig};
use tidal_rate::{premium_bps, RateEngine};
use tidal_tests::helpers::{addr, dynamic_engine, engine_at, fund, sum_of_effective, unit_config};

fn base_rates() -> RateEngine {
    RateEngine::new(unit_config().rate_params())
}

// ---------------------------------------------------------------------------
// Genesis -> bootstrap -> dynamic
// ---------------------------------------------------------------------------

#[test]
fn bootstrap_to_dynamic_scenario() {
    let config = unit_config();
    let drop = config.drop_amount();
    let mut engine = engine_at(config, 0);
    let a = addr(1);
    let b = addr(2);

    // T0: faucet drop with the day-one premium.
    engine.mint(&a, 0).unwrap();
    assert_eq!(engine.balance_of(&a), drop * premium_bps(1) as u128 / BPS_PRECISION as u128);
    assert_eq!(engine.phase(), Phase::Bootstrap);

    // T95: past the 90-period bootstrap.
    let flip = engine.rebase(95).unwrap();
    assert!(flip.entered_dynamic);
    assert_eq!(engine.phase(), Phase::Dynamic);
    assert_eq!(engine.moving_average_tx_count(), Fixed::ZERO);

    // 20 transfers in the next period.
    for _ in 0..20 {
        engine.transfer(&a, &b, TOKEN, 95).unwrap();
    }
    assert_eq!(engine.current_period_tx_count(), 20);
    let busy = engine.rebase(96).unwrap();
    assert_eq!(engine.global().previous_period_tx_count, 20);
    assert_eq!(busy.moving_average, Fixed::from_int(20));
    assert_eq!(engine.moving_average_tx_count(), Fixed::from_int(20));

    // A silent period: full burn pressure.
    let silent = engine.rebase(97).unwrap();
    let rates = base_rates();
    assert!(silent.rate.is_burn());
    assert_eq!(silent.rate, Rate::burn(3 * rates.base_burn_rate()));
    assert_eq!(engine.current_dynamic_rate(), silent.rate);
    assert_eq!(engine.period_stats(96).map(|s| s.tx_count), Some(0));
}

#[test]
fn premium_decays_over_bootstrap() {
    let config = unit_config();
    let drop = config.drop_amount();
    let mut engine = engine_at(config, 0);

    let mut last = u128::MAX;
    for (seed, now) in [(1u8, 0u64), (2, 2), (3, 3), (4, 10), (5, 89)] {
        let receipt = engine.mint(&addr(seed), now).unwrap();
        assert_eq!(receipt.premium_bps, engine.premium(now));
        assert!(receipt.amount <= last);
        assert!(receipt.amount >= drop);
        last = receipt.amount;
    }
    assert_eq!(engine.premium(2), 11_666);
}

#[test]
fn faucet_closes_when_dynamic() {
    let (mut engine, flip) = dynamic_engine(1);
    assert_eq!(engine.mint(&addr(9), flip), Err(StabilizerError::BootstrapEnded));
}

#[test]
fn faucet_cannot_be_replayed_with_earlier_timestamps() {
    let mut engine = engine_at(unit_config(), 0);
    let a = addr(1);
    let first = engine.mint(&a, 5).unwrap();
    assert_eq!(engine.global().last_rebase_time, 5);

    let stale = StabilizerError::StaleTimestamp { now: 4, open_period_start: 5 };
    assert_eq!(engine.mint(&a, 4), Err(stale.clone()));
    assert_eq!(engine.mint(&a, 5), Err(StabilizerError::DropCooldown { next_claim: 6 }));
    assert_eq!(engine.mint(&a, 4), Err(stale));

    assert_eq!(engine.total_supply(), first.amount);
    assert_eq!(engine.balance_of(&a), first.amount);
    assert_eq!(engine.current_period_tx_count(), 1);
}

#[test]
fn interleaved_clocks_through_shared_handle() {
    let shared = SharedStabilizer::new(engine_at(unit_config(), 0));
    shared.mint(&addr(1), 5).unwrap();
    // A caller that read the clock earlier but took the lock later.
    assert!(matches!(
        shared.transfer(&addr(1), &addr(2), TOKEN, 4),
        Err(StabilizerError::StaleTimestamp { .. })
    ));
    assert_eq!(shared.balance_of(&addr(2)), 0);
    assert_eq!(shared.read().current_period_tx_count(), 1);
}

// ---------------------------------------------------------------------------
// Lazy settlement
// ---------------------------------------------------------------------------

#[test]
fn idle_account_receives_every_increment_once() {
    let (mut engine, flip) = dynamic_engine(3);
    let idle = addr(3);
    let idle_balance = engine.effective_balance_of(&idle);
    let checkpoint = engine.account(&idle).unwrap().mint_rate_checkpoint;

    // Several periods of steady activity between two other holders.
    let mut accrued = Rate::ZERO;
    let mut now = flip;
    for _ in 0..7 {
        now += 1;
        let out = engine.rebase(now).unwrap();
        if out.rate.is_mint() {
            accrued = accrued.saturating_add(out.rate);
        }
        for _ in 0..5 {
            engine.transfer(&addr(1), &addr(2), TOKEN, now).unwrap();
        }
    }
    assert!(accrued.is_mint());
    assert_eq!(engine.accumulated_mint_rate().saturating_delta(checkpoint), accrued);

    let expected_mint = accrued.apply(idle_balance);
    assert_eq!(engine.balance_of(&idle), idle_balance + expected_mint);
    // Untouched: still the old raw balance.
    assert_eq!(engine.effective_balance_of(&idle), idle_balance);

    engine.burn(&idle, 1, now).unwrap();
    assert_eq!(engine.effective_balance_of(&idle), idle_balance + expected_mint - 1);

    // A second touch finds nothing new to pull.
    engine.burn(&idle, 1, now).unwrap();
    assert_eq!(engine.effective_balance_of(&idle), idle_balance + expected_mint - 2);
}

#[test]
fn shared_increment_scales_with_each_balance() {
    let (mut engine, flip) = dynamic_engine(4);
    // Give holder 4 twice holder 3's balance.
    engine.transfer(&addr(1), &addr(4), engine.effective_balance_of(&addr(1)), flip).unwrap();
    let small = engine.effective_balance_of(&addr(3));
    let large = engine.effective_balance_of(&addr(4));
    assert_eq!(large, 2 * small);

    engine.rebase(flip + 1).unwrap();
    let accrued = engine.accumulated_mint_rate();
    assert!(accrued.is_mint());

    engine.burn(&addr(3), 1, flip + 1).unwrap();
    engine.burn(&addr(4), 1, flip + 1).unwrap();
    let minted_small = engine.effective_balance_of(&addr(3)) + 1 - small;
    let minted_large = engine.effective_balance_of(&addr(4)) + 1 - large;
    assert_eq!(minted_small, accrued.apply(small));
    assert_eq!(minted_large, accrued.apply(large));
    assert!(minted_large >= 2 * minted_small);
}

#[test]
fn conservation_holds_across_phases() {
    let (mut engine, flip) = dynamic_engine(5);
    let mut now = flip;
    for round in 0..10u64 {
        now += 1;
        for seed in 1..=5u8 {
            let to = addr(seed % 5 + 1);
            let amount = TOKEN * (round as u128 + 1);
            engine.transfer(&addr(seed), &to, amount, now).unwrap();
            assert_eq!(sum_of_effective(&engine), engine.total_supply());
            assert_eq!(engine.ledger().sum_of_balances(), engine.total_supply());
        }
    }
}

// ---------------------------------------------------------------------------
// Burn on transfer
// ---------------------------------------------------------------------------

#[test]
fn burn_rate_taxes_transfers_not_explicit_burns() {
    let (mut engine, flip) = dynamic_engine(2);
    for _ in 0..20 {
        engine.transfer(&addr(1), &addr(2), TOKEN, flip).unwrap();
    }
    engine.rebase(flip + 1).unwrap();
    let silent = engine.rebase(flip + 2).unwrap();
    assert!(silent.rate.is_burn());

    let now = flip + 2;
    let receipt = engine.transfer(&addr(1), &addr(2), 10 * TOKEN, now).unwrap();
    assert!(receipt.burned > 0);
    assert!(receipt.burned <= receipt.amount);
    assert_eq!(receipt.burned + receipt.received, receipt.amount);

    let before = engine.total_supply();
    engine.burn(&addr(2), TOKEN, now).unwrap();
    assert_eq!(engine.total_supply(), before - TOKEN);
}

// ---------------------------------------------------------------------------
// Shared handle and configuration
// ---------------------------------------------------------------------------

#[test]
fn shared_handle_runs_the_scenario() {
    let config = unit_config();
    let shared = SharedStabilizer::new(engine_at(config, 0));
    shared.mint(&addr(1), 0).unwrap();
    shared.rebase(95).unwrap();
    for _ in 0..20 {
        shared.transfer(&addr(1), &addr(2), TOKEN, 95).unwrap();
    }
    shared.rebase(96).unwrap();
    let silent = shared.rebase(97).unwrap();
    assert!(silent.rate.is_burn());
    assert_eq!(shared.snapshot().periods.len(), 3);
}

#[test]
fn engine_from_config_file() {
    use std::io::Write;

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "period_length_secs = 3600").unwrap();
    writeln!(file, "year_length_secs = 31536000").unwrap();
    writeln!(file, "bootstrap_duration_periods = 2").unwrap();
    let config = StabilizerConfig::load(Some(file.path())).unwrap();

    let mut engine = engine_at(config, 1_000);
    fund(&mut engine, 2, 1_000);
    assert!(matches!(engine.rebase(4_000), Err(StabilizerError::TooEarly { next_rebase: 4_600, .. })));
    engine.rebase(4_600).unwrap();
    assert!(engine.rebase(8_200).unwrap().entered_dynamic);

    let json = engine.snapshot().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["accounts"].as_array().map(Vec::len), Some(2));
}
