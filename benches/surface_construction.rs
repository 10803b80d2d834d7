use std::hint::black_box;

use chrono::{Days, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use ivsurface::grid::{GridConfig, interpolate};
use ivsurface::implied::{SolverConfig, black_price};
use ivsurface::surface::{Aggregator, SurfaceBuilder};
use ivsurface::{MarketContext, OptionQuote, OptionType};

const SPOT: f64 = 100.0;
const RATE: f64 = 0.04;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 2).expect("valid benchmark date")
}

fn market() -> MarketContext {
    let at = today().and_hms_opt(16, 0, 0).expect("valid benchmark time");
    MarketContext::new(SPOT, RATE, at).expect("benchmark context should be valid")
}

/// Synthetic skewed chain: `n_expiries` × `n_strikes` quotes for one side.
fn generate_chain(side: OptionType, n_expiries: usize, n_strikes: usize) -> Vec<OptionQuote> {
    let mut out = Vec::with_capacity(n_expiries * n_strikes);
    for e in 1..=n_expiries {
        let days = 30 * e as u64;
        let t = days as f64 / 365.0;
        for i in 0..n_strikes {
            let strike = SPOT * (0.7 + 0.6 * i as f64 / (n_strikes - 1) as f64);
            let x = (strike / SPOT).ln();
            let vol = 0.22 - 0.2 * x + 0.5 * x * x;
            let price = black_price(side, SPOT, strike, t, RATE, vol).expect("benchmark price");
            out.push(OptionQuote {
                strike,
                bid: Some(price * 0.99),
                ask: Some(price * 1.01),
                last_price: Some(price),
                expiration: today() + Days::new(days),
                side,
            });
        }
    }
    out
}

fn aggregation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let ctx = market();

    // Typical listed chain: 12 expiries × 40 strikes
    let calls = generate_chain(OptionType::Call, 12, 40);
    let aggregator = Aggregator::new(OptionType::Call, SolverConfig::for_side(OptionType::Call))
        .expect("benchmark solver config should be valid");
    group.bench_function("calls_12x40", |b| {
        b.iter(|| aggregator.run(black_box(&calls), black_box(&ctx)))
    });

    let puts = generate_chain(OptionType::Put, 12, 40);
    let aggregator = Aggregator::new(OptionType::Put, SolverConfig::for_side(OptionType::Put))
        .expect("benchmark solver config should be valid");
    group.bench_function("puts_12x40", |b| {
        b.iter(|| aggregator.run(black_box(&puts), black_box(&ctx)))
    });

    group.finish();
}

fn gridding_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("gridding");
    let ctx = market();

    for (n_expiries, n_strikes) in [(4, 10), (12, 40)] {
        let chain = generate_chain(OptionType::Call, n_expiries, n_strikes);
        let points = Aggregator::new(OptionType::Call, SolverConfig::default())
            .and_then(|a| a.run(&chain, &ctx))
            .expect("benchmark aggregation should succeed")
            .points;
        let config = GridConfig::default();
        group.bench_function(format!("interpolate_{n_expiries}x{n_strikes}_50x50"), |b| {
            b.iter(|| interpolate(black_box(&points), black_box(&config)))
        });
    }

    group.finish();
}

fn end_to_end_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let ctx = market();
    let calls = generate_chain(OptionType::Call, 8, 25);
    let puts = generate_chain(OptionType::Put, 8, 25);

    group.bench_function("two_sided_8x25", |b| {
        b.iter(|| {
            SurfaceBuilder::new()
                .context(black_box(ctx))
                .calls(black_box(&calls))
                .puts(black_box(&puts))
                .build()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    aggregation_benchmarks,
    gridding_benchmarks,
    end_to_end_benchmarks
);
criterion_main!(benches);
