//! Criterion benchmarks for tidal-rate critical operations.
//!
//! Covers: trend classification, full period rate, moving average and premium.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tidal_core::constants::TOKEN;
use tidal_core::fixed::Fixed;
use tidal_core::traits::{ActivitySample, RateCalculator};
use tidal_rate::activity::ActivityTracker;
use tidal_rate::engine::RateEngine;
use tidal_rate::premium::premium_bps;

fn bench_activity_trend(c: &mut Criterion) {
    let engine = RateEngine::default();

    c.bench_function("activity_trend", |b| {
        b.iter(|| engine.activity_trend(black_box(137), black_box(100)))
    });
}

fn bench_period_rate(c: &mut Criterion) {
    let engine = RateEngine::default();
    let sample = ActivitySample {
        tx_count: 40,
        average: 100,
        total_supply: 10_000_000 * TOKEN,
    };

    c.bench_function("period_rate", |b| {
        b.iter(|| engine.period_rate(black_box(&sample)))
    });
}

fn bench_moving_average(c: &mut Criterion) {
    let tracker = ActivityTracker::new(100);
    let average = Fixed::from_int(1_234);

    c.bench_function("moving_average", |b| {
        b.iter(|| tracker.next_average(black_box(average), black_box(987)))
    });
}

fn bench_premium(c: &mut Criterion) {
    c.bench_function("premium_bps", |b| b.iter(|| premium_bps(black_box(42))));
}

criterion_group!(
    benches,
    bench_activity_trend,
    bench_period_rate,
    bench_moving_average,
    bench_premium,
);
criterion_main!(benches);
