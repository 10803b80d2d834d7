//! Per-side aggregation of option quotes into surface points.
//!
//! Each quote of the requested side is priced from its bid/ask mid (or last
//! trade), inverted to an implied volatility, and placed at its
//! side-oriented moneyness and time to expiry. Quotes that cannot produce a
//! volatility are dropped and counted in an [`AggregationReport`]; only a
//! malformed strike aborts the run.
//!
//! ```
//! use chrono::NaiveDate;
//! use ivsurface::implied::{black_price, SolverConfig};
//! use ivsurface::surface::aggregate;
//! use ivsurface::{MarketContext, OptionQuote, OptionType};
//!
//! let now = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(16, 0, 0).unwrap();
//! let expiration = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
//! let ctx = MarketContext::new(100.0, 0.05, now)?;
//! let price = black_price(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.25)?;
//! let quote = OptionQuote {
//!     strike: 100.0,
//!     bid: None,
//!     ask: None,
//!     last_price: Some(price),
//!     expiration,
//!     side: OptionType::Call,
//! };
//!
//! let points = aggregate(&[quote], &ctx, OptionType::Call, &SolverConfig::default())?;
//! assert_eq!(points.len(), 1);
//! assert!((points[0].implied_vol.0 - 0.25).abs() < 0.01);
//! # Ok::<(), ivsurface::IvSurfaceError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::implied::{ImpliedVolSolver, SolverConfig};
use crate::quote::{ExpiryWindow, MarketContext, OptionQuote, PricingInputs};
use crate::surface::SurfacePoint;
use crate::types::{Moneyness, OptionType, Tenor};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Counts of what happened to each quote in an aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Quotes handed to the aggregator.
    pub quotes: usize,
    /// Quotes of the other contract side, ignored.
    pub other_side: usize,
    /// Expiration outside the requested window.
    pub outside_window: usize,
    /// Time to expiry `T ≤ 0` (expired or expiring today).
    pub expired: usize,
    /// No usable bid/ask mid or last price.
    pub no_price: usize,
    /// Market price below the arbitrage floor.
    pub below_floor: usize,
    /// Solver returned a non-finite or negative volatility.
    pub non_finite: usize,
    /// Points emitted from a non-converged solve (flat vega or iteration cap).
    pub non_converged: usize,
    /// Points emitted.
    pub emitted: usize,
}

/// Points and diagnostics from one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Surface points in input order.
    pub points: Vec<SurfacePoint>,
    /// Counts of quotes kept and dropped, by reason.
    pub report: AggregationReport,
}

/// What happened to a single quote.
enum QuoteOutcome {
    Point(SurfacePoint),
    OtherSide,
    OutsideWindow,
    Expired,
    NoPrice,
    BelowFloor,
    NonFinite,
}

/// Stateless aggregator for one contract side.
///
/// Holds only configuration; the same aggregator can be reused across
/// runs and shared between threads.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    side: OptionType,
    solver: ImpliedVolSolver,
    window: ExpiryWindow,
}

impl Aggregator {
    /// Create an aggregator for `side` using `config` for every solve.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`](crate::IvSurfaceError::InvalidInput)
    /// if `config` is invalid.
    pub fn new(side: OptionType, config: SolverConfig) -> crate::error::Result<Self> {
        Ok(Self {
            side,
            solver: ImpliedVolSolver::new(config)?,
            window: ExpiryWindow::unbounded(),
        })
    }

    /// Restrict aggregation to expirations inside `window`.
    pub fn window(mut self, window: ExpiryWindow) -> Self {
        self.window = window;
        self
    }

    /// Contract side this aggregator processes.
    pub fn side(&self) -> OptionType {
        self.side
    }

    /// Aggregate `quotes` under `ctx`.
    ///
    /// Output order follows input order.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`](crate::IvSurfaceError::InvalidInput)
    /// if `ctx` is malformed or any selected quote has a non-positive or
    /// non-finite strike.
    pub fn run(
        &self,
        quotes: &[OptionQuote],
        ctx: &MarketContext,
    ) -> crate::error::Result<Aggregation> {
        ctx.validate()?;

        #[cfg(feature = "parallel")]
        let outcomes: Vec<QuoteOutcome> = quotes
            .par_iter()
            .map(|q| self.evaluate(q, ctx))
            .collect::<crate::error::Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<QuoteOutcome> = quotes
            .iter()
            .map(|q| self.evaluate(q, ctx))
            .collect::<crate::error::Result<Vec<_>>>()?;

        let mut report = AggregationReport {
            quotes: quotes.len(),
            ..AggregationReport::default()
        };
        let mut points = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                QuoteOutcome::Point(p) => {
                    if !p.converged {
                        report.non_converged += 1;
                    }
                    points.push(p);
                }
                QuoteOutcome::OtherSide => report.other_side += 1,
                QuoteOutcome::OutsideWindow => report.outside_window += 1,
                QuoteOutcome::Expired => report.expired += 1,
                QuoteOutcome::NoPrice => report.no_price += 1,
                QuoteOutcome::BelowFloor => report.below_floor += 1,
                QuoteOutcome::NonFinite => report.non_finite += 1,
            }
        }
        report.emitted = points.len();

        #[cfg(feature = "logging")]
        tracing::debug!(
            side = %self.side,
            quotes = report.quotes,
            emitted = report.emitted,
            expired = report.expired,
            no_price = report.no_price,
            below_floor = report.below_floor,
            non_converged = report.non_converged,
            "aggregation complete"
        );

        Ok(Aggregation { points, report })
    }

    fn evaluate(
        &self,
        quote: &OptionQuote,
        ctx: &MarketContext,
    ) -> crate::error::Result<QuoteOutcome> {
        if quote.side != self.side {
            return Ok(QuoteOutcome::OtherSide);
        }
        if !self.window.contains(quote.expiration) {
            return Ok(QuoteOutcome::OutsideWindow);
        }
        let inputs = PricingInputs::from_quote(quote, ctx)?;
        if inputs.expiry <= 0.0 {
            return Ok(QuoteOutcome::Expired);
        }
        let Some(market_price) = quote.market_price() else {
            return Ok(QuoteOutcome::NoPrice);
        };

        let result = self.solver.solve(market_price, &inputs)?;
        let Some(sigma) = result.sigma else {
            return Ok(QuoteOutcome::BelowFloor);
        };
        if !sigma.0.is_finite() || sigma.0 < 0.0 {
            return Ok(QuoteOutcome::NonFinite);
        }

        Ok(QuoteOutcome::Point(SurfacePoint {
            moneyness: Moneyness(inputs.moneyness()),
            time_to_expiry: Tenor(inputs.expiry),
            implied_vol: sigma,
            side: self.side,
            converged: result.converged,
        }))
    }
}

/// Aggregate one side of an option chain into surface points.
///
/// Shorthand for [`Aggregator::new`] + [`Aggregator::run`] with an
/// unbounded expiry window, discarding the report.
///
/// # Errors
/// See [`Aggregator::run`].
pub fn aggregate(
    quotes: &[OptionQuote],
    ctx: &MarketContext,
    side: OptionType,
    config: &SolverConfig,
) -> crate::error::Result<Vec<SurfacePoint>> {
    Ok(aggregate_with_report(quotes, ctx, side, config)?.points)
}

/// Like [`aggregate`], but also returns the per-run [`AggregationReport`].
///
/// # Errors
/// See [`Aggregator::run`].
pub fn aggregate_with_report(
    quotes: &[OptionQuote],
    ctx: &MarketContext,
    side: OptionType,
    config: &SolverConfig,
) -> crate::error::Result<Aggregation> {
    Aggregator::new(side, *config)?.run(quotes, ctx)
}
