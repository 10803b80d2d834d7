//! Natural cubic spline through 1-D knots.
//!
//! Used when every surface point lies on one line (a single expiry, a single
//! moneyness, or any other collinear set) and no triangulation exists.
//!
//! The second-derivative system is tridiagonal and solved with the Thomas
//! algorithm (O(n)) under natural boundary conditions S''(x₀) = S''(xₙ₋₁) = 0.
//! Two knots degenerate to a straight line. Evaluation is restricted to the
//! knot range; there is no extrapolation.

use crate::error::IvSurfaceError;
use crate::validate::validate_same_len;

/// Coefficients for one cubic polynomial interval.
///
/// On interval \[xᵢ, xᵢ₊₁\]: `S(x) = a + b·(x − xᵢ) + c·(x − xᵢ)² + d·(x − xᵢ)³`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

/// Natural cubic spline on strictly increasing knots.
#[derive(Debug, Clone)]
pub(crate) struct NaturalSpline {
    knots: Vec<f64>,
    segments: Vec<Segment>,
    last_value: f64,
}

impl NaturalSpline {
    /// Fit a spline through `(x, y)` pairs.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] for fewer than two knots,
    /// mismatched lengths, non-finite values, or knots that are not strictly
    /// increasing.
    pub(crate) fn new(x: Vec<f64>, y: &[f64]) -> crate::error::Result<Self> {
        validate_same_len(&[("knots", x.len()), ("values", y.len())])?;
        if x.len() < 2 {
            return Err(IvSurfaceError::InvalidInput {
                message: format!("spline requires at least 2 knots, got {}", x.len()),
            });
        }
        if let Some(bad) = x.iter().chain(y).find(|v| !v.is_finite()) {
            return Err(IvSurfaceError::InvalidInput {
                message: format!("spline knots and values must be finite, got {bad}"),
            });
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(IvSurfaceError::InvalidInput {
                message: format!(
                    "knots must be strictly increasing, but x[{i}]={} >= x[{}]={}",
                    x[i],
                    i + 1,
                    x[i + 1]
                ),
            });
        }

        let segments = solve_segments(&x, y);
        Ok(Self {
            knots: x,
            segments,
            last_value: y[y.len() - 1],
        })
    }

    /// Value at `x`, or `None` outside the knot range.
    pub(crate) fn eval(&self, x: f64) -> Option<f64> {
        let n = self.knots.len();
        if !(self.knots[0]..=self.knots[n - 1]).contains(&x) {
            return None;
        }
        if x == self.knots[n - 1] {
            return Some(self.last_value);
        }
        let i = self.knots.partition_point(|&k| k <= x) - 1;
        let dx = x - self.knots[i];
        let s = &self.segments[i];
        Some(s.a + dx * (s.b + dx * (s.c + dx * s.d)))
    }

    /// First and last knot.
    pub(crate) fn range(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }
}

fn solve_segments(x: &[f64], y: &[f64]) -> Vec<Segment> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    // Second-derivative terms; zero at both ends.
    let mut c = vec![0.0; n];
    if n > 2 {
        let m = n - 2;
        let mut diag = Vec::with_capacity(m);
        let mut rhs = Vec::with_capacity(m);
        for i in 1..=m {
            diag.push(2.0 * (h[i - 1] + h[i]));
            rhs.push(3.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]));
        }

        // Forward sweep. Row j has sub-diagonal h[j] and super-diagonal h[j + 1].
        for j in 1..m {
            let w = h[j] / diag[j - 1];
            diag[j] -= w * h[j];
            rhs[j] -= w * rhs[j - 1];
        }

        c[m] = rhs[m - 1] / diag[m - 1];
        for j in (0..m - 1).rev() {
            c[j + 1] = (rhs[j] - h[j + 1] * c[j + 2]) / diag[j];
        }
    }

    (0..n - 1)
        .map(|i| Segment {
            a: y[i],
            b: (y[i + 1] - y[i]) / h[i] - h[i] * (2.0 * c[i] + c[i + 1]) / 3.0,
            c: c[i],
            d: (c[i + 1] - c[i]) / (3.0 * h[i]),
        })
        .collect()
}
