//! Builder for a complete two-sided surface run.
//!
//! ```
//! use chrono::NaiveDate;
//! use ivsurface::implied::black_price;
//! use ivsurface::surface::SurfaceBuilder;
//! use ivsurface::{MarketContext, OptionQuote, OptionType};
//!
//! let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
//! let ctx = MarketContext::new(100.0, 0.03, today.and_hms_opt(15, 30, 0).unwrap())?;
//!
//! let mut calls = Vec::new();
//! for (days, t) in [(91, 91.0 / 365.0), (182, 182.0 / 365.0), (365, 1.0)] {
//!     for strike in [90.0, 100.0, 110.0] {
//!         calls.push(OptionQuote {
//!             strike,
//!             bid: None,
//!             ask: None,
//!             last_price: Some(black_price(OptionType::Call, 100.0, strike, t, 0.03, 0.25)?),
//!             expiration: today + chrono::Days::new(days),
//!             side: OptionType::Call,
//!         });
//!     }
//! }
//!
//! let outcome = SurfaceBuilder::new().context(ctx).calls(&calls).build()?;
//! let grid = outcome.surface().expect("nine quotes give a surface");
//! assert!(grid.filled_cells() > 0);
//! # Ok::<(), ivsurface::IvSurfaceError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::IvSurfaceError;
use crate::grid::{self, GridConfig, GridOutcome};
use crate::implied::SolverConfig;
use crate::quote::{ExpiryWindow, MarketContext, OptionQuote};
use crate::surface::SurfacePoint;
use crate::surface::aggregate::Aggregator;
use crate::types::OptionType;

/// Settings for a full surface run.
///
/// Calls and puts are solved with separate configurations; the defaults
/// follow [`SolverConfig::for_side`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Solver settings for calls.
    pub call_solver: SolverConfig,
    /// Solver settings for puts.
    pub put_solver: SolverConfig,
    /// Grid resolution and moneyness band.
    pub grid: GridConfig,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            call_solver: SolverConfig::for_side(OptionType::Call),
            put_solver: SolverConfig::for_side(OptionType::Put),
            grid: GridConfig::default(),
        }
    }
}

impl SurfaceConfig {
    /// Solver configuration for `side`.
    pub fn solver(&self, side: OptionType) -> SolverConfig {
        match side {
            OptionType::Call => self.call_solver,
            OptionType::Put => self.put_solver,
        }
    }

    /// Validate every nested configuration.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] for the first invalid field.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.call_solver.validate()?;
        self.put_solver.validate()?;
        self.grid.validate()
    }
}

/// Builder for a surface from both sides of an option chain.
///
/// Calls and puts are aggregated independently, concatenated (calls first),
/// and resampled onto a grid.
#[derive(Debug, Clone, Default)]
pub struct SurfaceBuilder {
    context: Option<MarketContext>,
    calls: Vec<OptionQuote>,
    puts: Vec<OptionQuote>,
    window: ExpiryWindow,
    config: SurfaceConfig,
}

impl SurfaceBuilder {
    /// Create a builder with default configuration and no quotes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the market snapshot. Required.
    pub fn context(mut self, context: MarketContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Add call quotes. Can be called repeatedly.
    pub fn calls(mut self, quotes: &[OptionQuote]) -> Self {
        self.calls.extend_from_slice(quotes);
        self
    }

    /// Add put quotes. Can be called repeatedly.
    pub fn puts(mut self, quotes: &[OptionQuote]) -> Self {
        self.puts.extend_from_slice(quotes);
        self
    }

    /// Restrict both sides to expirations inside `window`.
    pub fn window(mut self, window: ExpiryWindow) -> Self {
        self.window = window;
        self
    }

    /// Replace the run configuration.
    pub fn config(mut self, config: SurfaceConfig) -> Self {
        self.config = config;
        self
    }

    /// Surface points from calls, then puts.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] if the context is missing or
    /// malformed, the configuration is invalid, or a quote has a
    /// non-positive strike.
    pub fn points(&self) -> crate::error::Result<Vec<SurfacePoint>> {
        let ctx = self.context.ok_or_else(|| IvSurfaceError::InvalidInput {
            message: "market context is required".into(),
        })?;
        self.config.validate()?;

        let mut points = Vec::with_capacity(self.calls.len() + self.puts.len());
        for (side, quotes) in [(OptionType::Call, &self.calls), (OptionType::Put, &self.puts)] {
            let run = Aggregator::new(side, self.config.solver(side))?
                .window(self.window)
                .run(quotes, &ctx)?;
            points.extend(run.points);
        }
        Ok(points)
    }

    /// Aggregate both sides and grid the result.
    ///
    /// # Errors
    /// See [`SurfaceBuilder::points`].
    pub fn build(self) -> crate::error::Result<GridOutcome> {
        #[cfg(feature = "logging")]
        tracing::debug!(
            calls = self.calls.len(),
            puts = self.puts.len(),
            "surface build started"
        );

        let points = self.points()?;
        let outcome = grid::interpolate(&points, &self.config.grid)?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            points = points.len(),
            no_data = outcome.is_no_data(),
            "surface build complete"
        );

        Ok(outcome)
    }
}
