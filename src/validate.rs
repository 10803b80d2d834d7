//! Input checks shared by the pricer, solver and grid.
//!
//! Every check names the offending field so errors surfaced from deep in a
//! run still point at the bad input.

use crate::error::IvSurfaceError;

/// Require `value` to be finite and strictly positive (spot, strike, T in
/// the solver, solver tolerances).
pub(crate) fn validate_positive(value: f64, name: &str) -> crate::error::Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(IvSurfaceError::InvalidInput {
            message: format!("{name} must be positive and finite, got {value}"),
        });
    }
    Ok(())
}

/// Require `value` to be finite; zero and negatives are allowed (rates).
pub(crate) fn validate_finite(value: f64, name: &str) -> crate::error::Result<()> {
    if !value.is_finite() {
        return Err(IvSurfaceError::InvalidInput {
            message: format!("{name} must be finite, got {value}"),
        });
    }
    Ok(())
}

/// Require a finite, non-inverted closed interval `[lo, hi]`.
pub(crate) fn validate_interval(lo: f64, hi: f64, name: &str) -> crate::error::Result<()> {
    validate_finite(lo, name)?;
    validate_finite(hi, name)?;
    if lo > hi {
        return Err(IvSurfaceError::InvalidInput {
            message: format!("{name} is inverted: [{lo}, {hi}]"),
        });
    }
    Ok(())
}

/// Require parallel arrays to have equal lengths; `columns` pairs each
/// array's name with its length.
pub(crate) fn validate_same_len(columns: &[(&str, usize)]) -> crate::error::Result<()> {
    let Some(&(_, expected)) = columns.first() else {
        return Ok(());
    };
    if columns.iter().any(|&(_, len)| len != expected) {
        let listing: Vec<String> = columns
            .iter()
            .map(|(name, len)| format!("{name} ({len})"))
            .collect();
        return Err(IvSurfaceError::InvalidInput {
            message: format!("{} must have the same length", listing.join(", ")),
        });
    }
    Ok(())
}
