//! Implied-volatility surface points and their construction from quotes.
//!
//! - [`aggregate`] / [`Aggregator`]: one contract side of a chain → points
//! - [`SurfaceBuilder`]: both sides plus gridding in one run
//!
//! A [`SurfacePoint`] is a single observation of implied volatility at a
//! (moneyness, time to expiry) coordinate. Points are resampled onto a
//! regular grid by [`crate::grid::interpolate`].

pub mod aggregate;
pub mod builder;

pub use aggregate::{Aggregation, AggregationReport, Aggregator, aggregate, aggregate_with_report};
pub use builder::{SurfaceBuilder, SurfaceConfig};

use serde::{Deserialize, Serialize};

use crate::types::{Moneyness, OptionType, Tenor, Vol};

/// One implied-volatility observation.
///
/// `moneyness` is side-oriented (S/K for calls, K/S for puts) so in-the-money
/// contracts of either side sit above 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// Side-oriented moneyness.
    pub moneyness: Moneyness,
    /// Years to expiry; always positive.
    pub time_to_expiry: Tenor,
    /// Implied volatility solved from the quote's market price.
    pub implied_vol: Vol,
    /// Contract side the quote came from.
    pub side: OptionType,
    /// Whether the solver met its tolerance. Non-converged points carry the
    /// last iterate.
    pub converged: bool,
}
