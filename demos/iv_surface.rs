//! Build an implied volatility surface from a synthetic option chain.
//!
//! Shows how to:
//!   - Describe quotes (bid/ask/last) and the market snapshot
//!   - Aggregate one side with diagnostics
//!   - Run both sides through `SurfaceBuilder` and read the grid
//!
//! Run with: `cargo run --example iv_surface`

use chrono::{Days, NaiveDate};
use ivsurface::implied::black_price;
use ivsurface::surface::{SurfaceBuilder, SurfaceConfig, aggregate_with_report};
use ivsurface::{GridConfig, GridOutcome, MarketContext, OptionQuote, OptionType};

/// Skewed smile: higher vol for low strikes, flattening with tenor.
fn smile_vol(strike: f64, spot: f64, t: f64) -> f64 {
    let x = (strike / spot).ln();
    0.20 - 0.15 * x / t.sqrt().max(0.3) + 0.4 * x * x
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let spot = 4_500.0;
    let rate = 0.045;
    let today = NaiveDate::from_ymd_opt(2025, 6, 10).ok_or("bad date")?;
    let ctx = MarketContext::new(spot, rate, today.and_hms_opt(16, 0, 0).ok_or("bad time")?)?;

    // ---------------------------------------------------------------
    // 1. Synthetic chain: 5 expiries × 11 strikes per side
    // ---------------------------------------------------------------

    let mut calls = Vec::new();
    let mut puts = Vec::new();
    for days in [14u64, 45, 90, 180, 365] {
        let t = days as f64 / 365.0;
        for i in 0..11 {
            let strike = spot * (0.8 + 0.04 * i as f64);
            let vol = smile_vol(strike, spot, t);
            for side in [OptionType::Call, OptionType::Put] {
                let fair = black_price(side, spot, strike, t, rate, vol)?;
                let half_spread = (0.01 * fair).max(0.05);
                let quote = OptionQuote {
                    strike,
                    bid: Some((fair - half_spread).max(0.0)),
                    ask: Some(fair + half_spread),
                    last_price: Some(fair),
                    expiration: today + Days::new(days),
                    side,
                };
                match side {
                    OptionType::Call => calls.push(quote),
                    OptionType::Put => puts.push(quote),
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // 2. One side with diagnostics
    // ---------------------------------------------------------------

    let config = SurfaceConfig {
        grid: GridConfig::with_resolution(9),
        ..SurfaceConfig::default()
    };
    let calls_run = aggregate_with_report(&calls, &ctx, OptionType::Call, &config.call_solver)?;
    println!("Call aggregation");
    println!("  {:?}", calls_run.report);
    for p in calls_run.points.iter().take(5) {
        println!(
            "  m={:.4} T={:.4} σ={:.4} converged={}",
            p.moneyness.0, p.time_to_expiry.0, p.implied_vol.0, p.converged
        );
    }

    // ---------------------------------------------------------------
    // 3. Both sides, gridded
    // ---------------------------------------------------------------

    let outcome = SurfaceBuilder::new()
        .context(ctx)
        .calls(&calls)
        .puts(&puts)
        .config(config)
        .build()?;

    let grid = match outcome {
        GridOutcome::Surface(grid) => grid,
        GridOutcome::NoData(reason) => {
            println!("\nNo surface: {reason:?}");
            return Ok(());
        }
    };

    println!("\nGrid ({} of {} cells filled)", grid.filled_cells(), grid.vols().len());
    print!("{:>8}", "T \\ m");
    for m in grid.moneyness_axis() {
        print!("{m:>8.3}");
    }
    println!();
    for (j, t) in grid.tenor_axis().iter().enumerate() {
        print!("{t:>8.3}");
        for i in 0..grid.moneyness_axis().len() {
            match grid.get(j, i) {
                Some(v) => print!("{v:>8.4}"),
                None => print!("{:>8}", "-"),
            }
        }
        println!();
    }

    Ok(())
}
