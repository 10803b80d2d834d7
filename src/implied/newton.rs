//! Black-Scholes implied volatility by Newton-Raphson iteration.
//!
//! # Algorithm
//!
//! 1. Reject prices below the arbitrage floor (no volatility reproduces them).
//! 2. Start from a fixed seed volatility.
//! 3. Iterate `σ ← σ − (V(σ) − P) / vega(σ)` until `|V(σ) − P| < tol`.
//! 4. Stop early when vega falls below `min_vega`, returning the current σ
//!    as a non-converged estimate. Clamp σ to `vol_floor` after each step.
//!
//! The iteration is bounded by `max_iterations` and uses no randomness, so
//! identical inputs always give identical results.

use serde::{Deserialize, Serialize};

use crate::implied::black::{arbitrage_floor, price_unchecked, vega_unchecked};
use crate::quote::PricingInputs;
use crate::types::{OptionType, Vol};
use crate::validate::{validate_finite, validate_positive};

/// Tuning knobs of the Newton solver.
///
/// Every constant that shapes solver behaviour lives here so runs are
/// reproducible from their configuration alone.
///
/// ```
/// use ivsurface::implied::SolverConfig;
/// use ivsurface::OptionType;
///
/// let puts = SolverConfig::for_side(OptionType::Put);
/// assert_eq!(puts.tolerance, 0.01);
/// assert_eq!(puts.seed_vol, 0.30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Starting volatility for every quote.
    pub seed_vol: f64,
    /// Absolute price tolerance `|V(σ) − P|` for convergence.
    pub tolerance: f64,
    /// Maximum number of Newton updates.
    pub max_iterations: usize,
    /// Lower clamp applied to σ after each update.
    pub vol_floor: f64,
    /// Vega below which the iteration stops as degenerate.
    pub min_vega: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed_vol: 0.30,
            tolerance: 1e-3,
            max_iterations: 100,
            vol_floor: 1e-8,
            min_vega: 1e-8,
        }
    }
}

impl SolverConfig {
    /// Default configuration per contract side.
    ///
    /// Calls use a price tolerance of 0.001 and puts 0.01; all other fields
    /// are shared.
    pub fn for_side(side: OptionType) -> Self {
        match side {
            OptionType::Call => Self::default(),
            OptionType::Put => Self {
                tolerance: 1e-2,
                ..Self::default()
            },
        }
    }

    /// Replace the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replace the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check that every field is usable.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`](crate::IvSurfaceError::InvalidInput)
    /// if the seed, tolerance, floor or vega threshold is not positive and finite.
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_positive(self.seed_vol, "seed_vol")?;
        validate_positive(self.tolerance, "tolerance")?;
        validate_positive(self.vol_floor, "vol_floor")?;
        validate_positive(self.min_vega, "min_vega")?;
        Ok(())
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStop {
    /// Market price below the arbitrage floor; no iteration attempted.
    BelowFloor,
    /// Price matched within tolerance.
    Converged,
    /// Vega fell below `min_vega`.
    FlatVega,
    /// `max_iterations` exhausted.
    MaxIterations,
}

/// Outcome of one implied volatility inversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolResult {
    /// Implied volatility; `None` when the price is below the arbitrage floor.
    pub sigma: Option<Vol>,
    /// Whether the tolerance was met.
    pub converged: bool,
    /// Number of Newton updates applied.
    pub iterations: usize,
    /// Reason the iteration ended.
    pub stop: SolveStop,
}

impl ImpliedVolResult {
    fn undefined() -> Self {
        Self {
            sigma: None,
            converged: false,
            iterations: 0,
            stop: SolveStop::BelowFloor,
        }
    }

    fn stopped(sigma: f64, iterations: usize, stop: SolveStop) -> Self {
        Self {
            sigma: Some(Vol(sigma)),
            converged: stop == SolveStop::Converged,
            iterations,
            stop,
        }
    }

    /// Whether a volatility was produced (converged or best-effort).
    pub fn is_defined(&self) -> bool {
        self.sigma.is_some()
    }
}

/// Newton-Raphson implied volatility solver bound to one configuration.
#[derive(Debug, Clone, Copy)]
pub struct ImpliedVolSolver {
    config: SolverConfig,
}

impl ImpliedVolSolver {
    /// Create a solver after validating `config`.
    ///
    /// # Errors
    /// See [`SolverConfig::validate`].
    pub fn new(config: SolverConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this solver runs with.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Invert the pricer for `market_price` under `inputs`.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`](crate::IvSurfaceError::InvalidInput)
    /// for non-positive spot, strike or expiry, or non-finite rate/price.
    pub fn solve(
        &self,
        market_price: f64,
        inputs: &PricingInputs,
    ) -> crate::error::Result<ImpliedVolResult> {
        validate_positive(inputs.spot, "spot")?;
        validate_positive(inputs.strike, "strike")?;
        validate_positive(inputs.expiry, "expiry")?;
        validate_finite(inputs.rate, "rate")?;
        validate_finite(market_price, "market price")?;
        Ok(self.solve_unchecked(market_price, inputs))
    }

    fn solve_unchecked(&self, market_price: f64, inputs: &PricingInputs) -> ImpliedVolResult {
        let PricingInputs {
            spot,
            strike,
            expiry,
            rate,
            side,
        } = *inputs;
        let cfg = &self.config;

        if market_price < arbitrage_floor(side, spot, strike, expiry, rate) {
            return ImpliedVolResult::undefined();
        }

        let mut sigma = cfg.seed_vol;
        for iteration in 0..cfg.max_iterations {
            let diff = price_unchecked(side, spot, strike, expiry, rate, sigma) - market_price;
            if diff.abs() < cfg.tolerance {
                return ImpliedVolResult::stopped(sigma, iteration, SolveStop::Converged);
            }

            let vega = vega_unchecked(spot, strike, expiry, rate, sigma);
            if vega < cfg.min_vega {
                #[cfg(feature = "logging")]
                tracing::trace!(%side, strike, expiry, sigma, vega, "flat vega, stopping early");
                return ImpliedVolResult::stopped(sigma, iteration, SolveStop::FlatVega);
            }

            sigma -= diff / vega;
            if sigma < cfg.vol_floor {
                sigma = cfg.vol_floor;
            }
        }

        #[cfg(feature = "logging")]
        tracing::trace!(%side, strike, expiry, sigma, "iteration cap reached");
        ImpliedVolResult::stopped(sigma, cfg.max_iterations, SolveStop::MaxIterations)
    }
}

/// Implied volatility of a single European option.
///
/// Convenience wrapper around [`ImpliedVolSolver`].
///
/// # Errors
/// Returns [`IvSurfaceError::InvalidInput`](crate::IvSurfaceError::InvalidInput)
/// for an invalid `config` or malformed market inputs (including `T ≤ 0`).
///
/// ```
/// use ivsurface::implied::{solve_iv, SolverConfig};
/// use ivsurface::OptionType;
///
/// // Below the arbitrage floor: no implied volatility exists.
/// let res = solve_iv(OptionType::Call, 5.0, 120.0, 100.0, 1.0, 0.05, &SolverConfig::default())?;
/// assert!(res.sigma.is_none());
/// # Ok::<(), ivsurface::IvSurfaceError>(())
/// ```
#[allow(clippy::too_many_arguments)]
pub fn solve_iv(
    side: OptionType,
    market_price: f64,
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    config: &SolverConfig,
) -> crate::error::Result<ImpliedVolResult> {
    let inputs = PricingInputs {
        spot,
        strike,
        expiry,
        rate,
        side,
    };
    ImpliedVolSolver::new(*config)?.solve(market_price, &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implied::black::black_price;
    use approx::assert_abs_diff_eq;

    fn cfg() -> SolverConfig {
        SolverConfig::default()
    }

    #[test]
    fn recovers_textbook_atm_vol() {
        let price = black_price(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.20).unwrap();
        assert_abs_diff_eq!(price, 10.45, epsilon = 0.01);
        let res = solve_iv(OptionType::Call, price, 100.0, 100.0, 1.0, 0.05, &cfg()).unwrap();
        assert!(res.converged);
        assert_eq!(res.stop, SolveStop::Converged);
        assert_abs_diff_eq!(res.sigma.unwrap().0, 0.20, epsilon = 0.01);
    }

    #[test]
    fn recovers_put_vol_with_put_tolerance() {
        let price = black_price(OptionType::Put, 100.0, 110.0, 0.5, 0.03, 0.35).unwrap();
        let res = solve_iv(
            OptionType::Put,
            price,
            100.0,
            110.0,
            0.5,
            0.03,
            &SolverConfig::for_side(OptionType::Put),
        )
        .unwrap();
        assert!(res.converged);
        assert_abs_diff_eq!(res.sigma.unwrap().0, 0.35, epsilon = 0.01);
    }

    #[test]
    fn seed_already_converged_takes_zero_iterations() {
        let price = black_price(OptionType::Call, 100.0, 100.0, 1.0, 0.0, 0.30).unwrap();
        let res = solve_iv(OptionType::Call, price, 100.0, 100.0, 1.0, 0.0, &cfg()).unwrap();
        assert!(res.converged);
        assert_eq!(res.iterations, 0);
        assert_eq!(res.sigma.unwrap().0, 0.30);
    }

    #[test]
    fn below_floor_is_undefined_without_iterating() {
        let floor = arbitrage_floor(OptionType::Call, 120.0, 100.0, 1.0, 0.05);
        let res = solve_iv(OptionType::Call, floor - 1e-6, 120.0, 100.0, 1.0, 0.05, &cfg()).unwrap();
        assert!(res.sigma.is_none());
        assert!(!res.converged);
        assert_eq!(res.iterations, 0);
        assert_eq!(res.stop, SolveStop::BelowFloor);
    }

    #[test]
    fn just_above_floor_is_defined() {
        let floor = arbitrage_floor(OptionType::Call, 120.0, 100.0, 1.0, 0.05);
        let res = solve_iv(OptionType::Call, floor + 1e-6, 120.0, 100.0, 1.0, 0.05, &cfg()).unwrap();
        let sigma = res.sigma.unwrap().0;
        assert!(sigma.is_finite());
        assert!(sigma > 0.0);
    }

    #[test]
    fn put_floor_uses_discounted_strike() {
        let floor = arbitrage_floor(OptionType::Put, 80.0, 100.0, 1.0, 0.05);
        let below = solve_iv(OptionType::Put, floor - 1e-6, 80.0, 100.0, 1.0, 0.05, &cfg()).unwrap();
        let above = solve_iv(OptionType::Put, floor + 1e-6, 80.0, 100.0, 1.0, 0.05, &cfg()).unwrap();
        assert!(below.sigma.is_none());
        assert!(above.sigma.is_some());
    }

    #[test]
    fn deep_otm_near_zero_price_stays_positive_and_finite() {
        let res = solve_iv(OptionType::Call, 0.01, 100.0, 150.0, 0.1, 0.05, &cfg()).unwrap();
        let sigma = res.sigma.unwrap().0;
        assert!(sigma.is_finite());
        assert!(sigma > 0.0);
        assert!(matches!(res.stop, SolveStop::Converged | SolveStop::FlatVega));
    }

    #[test]
    fn zero_price_otm_drives_vol_down_but_stays_positive() {
        let config = cfg().with_tolerance(1e-12);
        let res = solve_iv(OptionType::Call, 0.0, 100.0, 150.0, 0.1, 0.05, &config).unwrap();
        let sigma = res.sigma.unwrap().0;
        assert!(sigma.is_finite());
        assert!(sigma >= config.vol_floor);
        assert!(sigma < config.seed_vol);
    }

    #[test]
    fn tiny_vega_threshold_stops_early() {
        // At the seed, vega of this deep OTM call is ~2e-3.
        let config = SolverConfig {
            min_vega: 1.0,
            ..cfg().with_tolerance(1e-12)
        };
        let res = solve_iv(OptionType::Call, 0.5, 100.0, 150.0, 0.1, 0.05, &config).unwrap();
        assert_eq!(res.stop, SolveStop::FlatVega);
        assert!(!res.converged);
        assert_eq!(res.iterations, 0);
        assert_eq!(res.sigma.unwrap().0, config.seed_vol);
    }

    #[test]
    fn exhausted_iterations_report_last_sigma() {
        let price = black_price(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.80).unwrap();
        let config = cfg().with_max_iterations(1).with_tolerance(1e-12);
        let res = solve_iv(OptionType::Call, price, 100.0, 100.0, 1.0, 0.05, &config).unwrap();
        assert!(!res.converged);
        assert_eq!(res.stop, SolveStop::MaxIterations);
        assert_eq!(res.iterations, 1);
        let sigma = res.sigma.unwrap().0;
        assert!(sigma > 0.30, "one Newton step should move toward 0.80, got {sigma}");
    }

    #[test]
    fn high_vol_short_dated_overshoot_stays_usable() {
        // Undamped Newton from 0.30 can jump far past 1.64 here; the result
        // is best-effort but must stay finite and above the floor.
        let price = black_price(OptionType::Call, 100.0, 120.0, 0.1, 0.03, 1.64).unwrap();
        let res = solve_iv(OptionType::Call, price, 100.0, 120.0, 0.1, 0.03, &cfg()).unwrap();
        let sigma = res.sigma.unwrap().0;
        assert!(sigma.is_finite());
        assert!(sigma >= cfg().vol_floor);
        assert!(res.iterations <= cfg().max_iterations);
    }

    #[test]
    fn zero_iteration_cap_returns_seed() {
        let config = cfg().with_max_iterations(0);
        let res = solve_iv(OptionType::Call, 10.0, 100.0, 100.0, 1.0, 0.05, &config).unwrap();
        assert_eq!(res.sigma.unwrap().0, config.seed_vol);
        assert_eq!(res.stop, SolveStop::MaxIterations);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let a = solve_iv(OptionType::Put, 3.21, 100.0, 95.0, 0.4, 0.02, &cfg()).unwrap();
        let b = solve_iv(OptionType::Put, 3.21, 100.0, 95.0, 0.4, 0.02, &cfg()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_positive_expiry() {
        assert!(solve_iv(OptionType::Call, 1.0, 100.0, 100.0, 0.0, 0.05, &cfg()).is_err());
        assert!(solve_iv(OptionType::Call, 1.0, 100.0, 100.0, -0.5, 0.05, &cfg()).is_err());
    }

    #[test]
    fn rejects_malformed_market() {
        assert!(solve_iv(OptionType::Call, 1.0, 0.0, 100.0, 1.0, 0.05, &cfg()).is_err());
        assert!(solve_iv(OptionType::Call, 1.0, 100.0, -5.0, 1.0, 0.05, &cfg()).is_err());
        assert!(solve_iv(OptionType::Call, f64::NAN, 100.0, 100.0, 1.0, 0.05, &cfg()).is_err());
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = cfg().with_tolerance(0.0);
        assert!(solve_iv(OptionType::Call, 10.0, 100.0, 100.0, 1.0, 0.05, &bad).is_err());
        let bad_seed = SolverConfig {
            seed_vol: -0.1,
            ..cfg()
        };
        assert!(ImpliedVolSolver::new(bad_seed).is_err());
    }

    #[test]
    fn side_defaults_differ_only_in_tolerance() {
        let c = SolverConfig::for_side(OptionType::Call);
        let p = SolverConfig::for_side(OptionType::Put);
        assert_eq!(c.tolerance, 0.001);
        assert_eq!(p.tolerance, 0.01);
        assert_eq!(c.with_tolerance(0.01), p);
    }

    #[test]
    fn config_deserializes_partial_documents() {
        let cfg: SolverConfig = serde_json::from_str(r#"{"tolerance": 1e-6}"#).unwrap();
        assert_eq!(cfg.tolerance, 1e-6);
        assert_eq!(cfg.max_iterations, 100);
        assert_eq!(cfg.seed_vol, 0.30);
    }
}
