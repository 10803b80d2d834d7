//! Closed-form Black-Scholes pricing of European options.
//!
//! # Formula
//! ```text
//! d1 = (ln(S/K) + (r + σ²/2)·T) / (σ·√T)
//! d2 = d1 − σ·√T
//! C  = S·N(d1) − K·e^{−rT}·N(d2)
//! P  = K·e^{−rT}·N(−d2) − S·N(−d1)
//! ```
//!
//! With `T ≤ 0` or `σ ≤ 0` there is no optionality left and the price is
//! the undiscounted intrinsic value.

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::conventions::discount_factor;
use crate::types::OptionType;
use crate::validate::{validate_finite, validate_positive};

/// Standard normal cumulative distribution function N(x).
pub fn norm_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// Standard normal density φ(x).
pub fn norm_pdf(x: f64) -> f64 {
    Normal::standard().pdf(x)
}

/// The `d1` term. Requires `T > 0` and `σ > 0`.
pub(crate) fn d1(spot: f64, strike: f64, expiry: f64, rate: f64, vol: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * expiry) / (vol * expiry.sqrt())
}

/// Pricer core without input validation.
pub(crate) fn price_unchecked(
    side: OptionType,
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    vol: f64,
) -> f64 {
    if expiry <= 0.0 || vol <= 0.0 {
        return side.intrinsic(spot, strike);
    }
    let d1 = d1(spot, strike, expiry, rate, vol);
    let d2 = d1 - vol * expiry.sqrt();
    let df_strike = strike * discount_factor(rate, expiry);
    let value = match side {
        OptionType::Call => spot * norm_cdf(d1) - df_strike * norm_cdf(d2),
        OptionType::Put => df_strike * norm_cdf(-d2) - spot * norm_cdf(-d1),
    };
    // Cancellation deep in the wings can leave a tiny negative residue.
    value.max(0.0)
}

/// Vega ∂V/∂σ = S·φ(d1)·√T, identical for calls and puts.
///
/// Zero when `T ≤ 0` or `σ ≤ 0`.
pub(crate) fn vega_unchecked(spot: f64, strike: f64, expiry: f64, rate: f64, vol: f64) -> f64 {
    if expiry <= 0.0 || vol <= 0.0 {
        return 0.0;
    }
    spot * norm_pdf(d1(spot, strike, expiry, rate, vol)) * expiry.sqrt()
}

fn validate_market(spot: f64, strike: f64, expiry: f64, rate: f64) -> crate::error::Result<()> {
    validate_positive(spot, "spot")?;
    validate_positive(strike, "strike")?;
    validate_finite(expiry, "expiry")?;
    validate_finite(rate, "rate")?;
    Ok(())
}

/// Black-Scholes price of a European option.
///
/// # Arguments
/// * `side`: Call or Put
/// * `spot`: Underlying price `S` (must be > 0)
/// * `strike`: Strike `K` (must be > 0)
/// * `expiry`: Time to expiry `T` in years; `T ≤ 0` returns intrinsic value
/// * `rate`: Continuously-compounded risk-free rate `r`
/// * `vol`: Volatility `σ`; `σ ≤ 0` returns intrinsic value
///
/// # Errors
/// Returns [`IvSurfaceError::InvalidInput`](crate::IvSurfaceError::InvalidInput)
/// for non-positive spot/strike or non-finite inputs.
///
/// ```
/// use ivsurface::implied::black_price;
/// use ivsurface::OptionType;
///
/// let call = black_price(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.20)?;
/// assert!((call - 10.4506).abs() < 1e-3);
/// # Ok::<(), ivsurface::IvSurfaceError>(())
/// ```
pub fn black_price(
    side: OptionType,
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    vol: f64,
) -> crate::error::Result<f64> {
    validate_market(spot, strike, expiry, rate)?;
    validate_finite(vol, "vol")?;
    Ok(price_unchecked(side, spot, strike, expiry, rate, vol))
}

/// Black-Scholes vega ∂V/∂σ (per unit of volatility, not per 1%).
///
/// # Errors
/// Same conditions as [`black_price`].
pub fn black_vega(
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    vol: f64,
) -> crate::error::Result<f64> {
    validate_market(spot, strike, expiry, rate)?;
    validate_finite(vol, "vol")?;
    Ok(vega_unchecked(spot, strike, expiry, rate, vol))
}

/// Model-free lower bound on a European option price.
///
/// `max(0, S − K·e^{−rT})` for a call, `max(0, K·e^{−rT} − S)` for a put.
/// Market prices below this bound admit no implied volatility.
pub fn arbitrage_floor(side: OptionType, spot: f64, strike: f64, expiry: f64, rate: f64) -> f64 {
    side.intrinsic(spot, strike * discount_factor(rate, expiry))
}
