//! # ivsurface
//!
//! Implied volatility surfaces from raw option-chain quotes.
//!
//! The crate is a straight-line pipeline:
//! option quotes → market price → implied vol (Newton-Raphson on
//! Black-Scholes) → scattered (moneyness, tenor, vol) points → regular grid.
//!
//! ## Architecture
//!
//! - **`implied`**: Black-Scholes pricer and the Newton implied-vol solver
//! - **`surface`**: Per-side aggregation of quotes into [`SurfacePoint`]s and
//!   the two-sided [`SurfaceBuilder`](surface::SurfaceBuilder)
//! - **`grid`**: Resampling of scattered points onto a regular grid
//!   (Delaunay + Clough-Tocher cubic, missing cells outside the hull)
//! - **`quote`**: Input records: quotes, market context, expiry window
//!
//! ## Design
//!
//! - **Newtypes for outputs, bare `f64` for inputs.** [`Vol`], [`Tenor`] and
//!   [`Moneyness`] wrap values the pipeline produces; pricing functions take
//!   raw `f64` and validate internally.
//! - **No panics.** Every fallible operation returns [`Result`]. Library code
//!   never calls `unwrap()` or `expect()`.
//! - **Expected outcomes are values, not errors.** A quote priced below its
//!   arbitrage floor yields an undefined [`ImpliedVolResult`]; an empty run
//!   yields [`GridOutcome::NoData`].
//! - **Stateless.** No component keeps state across runs, so independent
//!   runs may execute in parallel without coordination.
//!
//! ```
//! use ivsurface::implied::{black_price, solve_iv, SolverConfig};
//! use ivsurface::OptionType;
//!
//! let price = black_price(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.20)?;
//! let iv = solve_iv(OptionType::Call, price, 100.0, 100.0, 1.0, 0.05, &SolverConfig::default())?;
//! assert!((iv.sigma.unwrap().0 - 0.20).abs() < 0.01);
//! # Ok::<(), ivsurface::IvSurfaceError>(())
//! ```

pub mod conventions;
pub mod error;
pub mod grid;
pub mod implied;
pub mod quote;
pub mod surface;
pub mod types;
mod validate;

#[doc(inline)]
pub use error::{IvSurfaceError, Result};
#[doc(inline)]
pub use grid::{Grid, GridConfig, GridOutcome, NoDataReason};
#[doc(inline)]
pub use implied::{ImpliedVolResult, SolverConfig};
#[doc(inline)]
pub use quote::{ExpiryWindow, MarketContext, OptionQuote};
#[doc(inline)]
pub use surface::SurfacePoint;
#[doc(inline)]
pub use types::{Moneyness, OptionType, Tenor, Vol};
