//! Market conventions used throughout the pipeline.
//!
//! Day count is actual calendar days over a 365-day year; moneyness is
//! oriented by contract side so that in-the-money is above 1 for both calls
//! and puts.

use chrono::NaiveDate;

use crate::types::OptionType;

/// Days per year used to annualize time to expiry.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Year fraction between two calendar dates: whole days / 365.
///
/// Negative when `expiration` precedes `evaluation`.
pub fn year_fraction(evaluation: NaiveDate, expiration: NaiveDate) -> f64 {
    (expiration - evaluation).num_days() as f64 / DAYS_PER_YEAR
}

/// Side-oriented moneyness: `S/K` for calls, `K/S` for puts.
pub fn moneyness(side: OptionType, spot: f64, strike: f64) -> f64 {
    match side {
        OptionType::Call => spot / strike,
        OptionType::Put => strike / spot,
    }
}

/// Continuous-compounding discount factor `e^{−rT}`.
pub fn discount_factor(rate: f64, expiry: f64) -> f64 {
    (-rate * expiry).exp()
}
