//! Core domain types for the implied volatility pipeline.
//!
//! **Outputs use newtypes.** [`Vol`], [`Tenor`] and [`Moneyness`] wrap the
//! three coordinates of a surface point so a caller cannot silently swap a
//! tenor for a volatility when reading results.
//!
//! **Inputs use bare `f64`.** Pricing and solving functions take raw floats
//! named after the quantity they represent.
//!
//! These types wrap `f64`, so only `PartialEq` / `PartialOrd` are derived.

use serde::{Deserialize, Serialize};

/// Implied volatility `σ`, annualized.
///
/// ```
/// use ivsurface::types::Vol;
/// let vol = Vol(0.20); // 20%
/// assert_eq!(vol.0, 0.20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

/// Time to expiry `T` in years (calendar days / 365).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Tenor(pub f64);

/// Side-oriented moneyness: `S/K` for calls, `K/S` for puts.
///
/// Values near 1 are at-the-money regardless of side; values above 1 are
/// in-the-money for both.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Moneyness(pub f64);

/// Contract side: call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Right to buy at strike price.
    Call,
    /// Right to sell at strike price.
    Put,
}

impl OptionType {
    /// Payoff at expiry: `max(0, S − K)` for a call, `max(0, K − S)` for a put.
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => f.write_str("call"),
            OptionType::Put => f.write_str("put"),
        }
    }
}
