//! Error types for the ivsurface library.
//!
//! Only genuinely malformed input or numeric breakdown is an error. Quotes
//! that cannot be priced and runs that produce no data are reported as
//! ordinary values by the pipeline.

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, IvSurfaceError>;

/// Errors that can occur while pricing, solving, aggregating or gridding.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IvSurfaceError {
    /// Input data is invalid (e.g., non-positive spot or strike, NaN rate,
    /// zero grid resolution).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Numerical computation failed (e.g., singular triangulation).
    #[error("numerical error: {message}")]
    NumericalError { message: String },
}
