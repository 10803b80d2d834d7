//! Option pricing and implied volatility extraction.
//!
//! - [`black`]: Closed-form Black-Scholes pricer, vega and arbitrage floor
//! - [`newton`]: Newton-Raphson inversion of the pricer with explicit
//!   convergence and degeneracy handling

pub mod black;
pub mod newton;

pub use black::{arbitrage_floor, black_price, black_vega, norm_cdf, norm_pdf};
pub use newton::{ImpliedVolResult, ImpliedVolSolver, SolveStop, SolverConfig, solve_iv};
