//! Resampling of scattered surface points onto a regular grid.
//!
//! Implied volatility is known only at the (moneyness, tenor) coordinates of
//! quoted contracts. [`interpolate`] lays a regular `n × n` grid over the
//! bounding box of those coordinates and fills each node with a C1 cubic
//! interpolant (Delaunay + Clough-Tocher). Nodes outside the convex hull of
//! the data are left missing rather than extrapolated.
//!
//! Coordinates are rescaled to the unit square before triangulation so the
//! two axes carry equal weight. When all points are collinear (for example a
//! single expiry), values are interpolated along the line with a natural
//! cubic spline instead.
//!
//! ```
//! use ivsurface::grid::{interpolate_scattered, GridConfig, GridOutcome};
//!
//! let m = [0.8, 1.2, 0.8, 1.2, 1.0];
//! let t = [0.25, 0.25, 1.0, 1.0, 0.5];
//! let v = [0.30, 0.22, 0.26, 0.20, 0.23];
//!
//! let outcome = interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(11))?;
//! let GridOutcome::Surface(grid) = outcome else { panic!("expected data") };
//! assert_eq!(grid.moneyness_axis().len(), 11);
//! assert!(grid.get(0, 0).is_some());
//! # Ok::<(), ivsurface::IvSurfaceError>(())
//! ```

pub(crate) mod clough_tocher;
pub(crate) mod delaunay;
pub(crate) mod spline;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::IvSurfaceError;
use crate::surface::SurfacePoint;
use crate::validate::{validate_interval, validate_same_len};
use clough_tocher::CloughTocher;
use delaunay::{Point, Triangulation};
use spline::NaturalSpline;

/// Perpendicular distance (in unit-square coordinates) below which points
/// count as lying on a common line.
const COLLINEAR_EPS: f64 = 1e-10;

/// Grid construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Nodes per axis.
    pub resolution: usize,
    /// Inclusive moneyness band; points outside are discarded as bad data.
    pub moneyness_band: (f64, f64),
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: 50,
            moneyness_band: (-7.0, 7.0),
        }
    }
}

impl GridConfig {
    /// Default settings with `resolution` nodes per axis.
    pub fn with_resolution(resolution: usize) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] for fewer than 2 nodes per
    /// axis or a non-finite or inverted moneyness band.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.resolution < 2 {
            return Err(IvSurfaceError::InvalidInput {
                message: format!(
                    "grid resolution must be at least 2, got {}",
                    self.resolution
                ),
            });
        }
        let (lo, hi) = self.moneyness_band;
        validate_interval(lo, hi, "moneyness band")
    }
}

/// Why a run produced nothing to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataReason {
    /// No surface points were supplied.
    NoPoints,
    /// Every point fell outside the moneyness band (or was non-finite).
    AllFilteredOut,
}

/// Result of gridding: a surface, or an explicit "nothing to show".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridOutcome {
    /// Nothing survived to grid, and why.
    NoData(NoDataReason),
    /// The resampled surface.
    Surface(Grid),
}

impl GridOutcome {
    /// The grid, if any data survived.
    pub fn surface(&self) -> Option<&Grid> {
        match self {
            GridOutcome::Surface(g) => Some(g),
            GridOutcome::NoData(_) => None,
        }
    }

    /// Consume the outcome, returning the grid if any.
    pub fn into_surface(self) -> Option<Grid> {
        match self {
            GridOutcome::Surface(g) => Some(g),
            GridOutcome::NoData(_) => None,
        }
    }

    /// True when there was nothing to grid.
    pub fn is_no_data(&self) -> bool {
        matches!(self, GridOutcome::NoData(_))
    }
}

/// Implied volatility resampled on a regular (tenor × moneyness) grid.
///
/// `vols[[j, i]]` is the volatility at `tenor_axis[j]`, `moneyness_axis[i]`;
/// `None` marks nodes outside the data's convex hull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    moneyness_axis: Vec<f64>,
    tenor_axis: Vec<f64>,
    vols: Array2<Option<f64>>,
}

impl Grid {
    /// Increasing moneyness coordinates (columns).
    pub fn moneyness_axis(&self) -> &[f64] {
        &self.moneyness_axis
    }

    /// Increasing tenor coordinates in years (rows).
    pub fn tenor_axis(&self) -> &[f64] {
        &self.tenor_axis
    }

    /// The full matrix, rows indexed by tenor and columns by moneyness.
    pub fn vols(&self) -> &Array2<Option<f64>> {
        &self.vols
    }

    /// Volatility at `(tenor_axis[tenor_idx], moneyness_axis[moneyness_idx])`.
    ///
    /// `None` for missing cells and out-of-range indices.
    pub fn get(&self, tenor_idx: usize, moneyness_idx: usize) -> Option<f64> {
        self.vols.get((tenor_idx, moneyness_idx)).copied().flatten()
    }

    /// Number of non-missing nodes.
    pub fn filled_cells(&self) -> usize {
        self.vols.iter().filter(|v| v.is_some()).count()
    }
}

/// Resample surface points onto a regular grid.
///
/// # Errors
/// Returns [`IvSurfaceError::InvalidInput`] for an invalid `config`.
pub fn interpolate(points: &[SurfacePoint], config: &GridConfig) -> crate::error::Result<GridOutcome> {
    let moneyness: Vec<f64> = points.iter().map(|p| p.moneyness.0).collect();
    let tenor: Vec<f64> = points.iter().map(|p| p.time_to_expiry.0).collect();
    let vols: Vec<f64> = points.iter().map(|p| p.implied_vol.0).collect();
    interpolate_scattered(&moneyness, &tenor, &vols, config)
}

/// Resample three parallel arrays of scattered data onto a regular grid.
///
/// # Errors
/// Returns [`IvSurfaceError::InvalidInput`] for mismatched array lengths or
/// an invalid `config`.
pub fn interpolate_scattered(
    moneyness: &[f64],
    tenor: &[f64],
    vols: &[f64],
    config: &GridConfig,
) -> crate::error::Result<GridOutcome> {
    config.validate()?;
    validate_same_len(&[
        ("moneyness", moneyness.len()),
        ("tenor", tenor.len()),
        ("vols", vols.len()),
    ])?;
    if moneyness.is_empty() {
        return Ok(GridOutcome::NoData(NoDataReason::NoPoints));
    }

    let (lo, hi) = config.moneyness_band;
    let mut data: Vec<(f64, f64, f64)> = moneyness
        .iter()
        .zip(tenor)
        .zip(vols)
        .map(|((&m, &t), &v)| (m, t, v))
        .filter(|&(m, t, v)| (lo..=hi).contains(&m) && t.is_finite() && v.is_finite())
        .collect();
    if data.is_empty() {
        return Ok(GridOutcome::NoData(NoDataReason::AllFilteredOut));
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        points = moneyness.len(),
        kept = data.len(),
        resolution = config.resolution,
        "grid build started"
    );

    merge_coincident(&mut data);

    let (m_min, m_max) = min_max(data.iter().map(|d| d.0));
    let (t_min, t_max) = min_max(data.iter().map(|d| d.1));
    let n = config.resolution;
    let moneyness_axis = linspace(m_min, m_max, n);
    let tenor_axis = linspace(t_min, t_max, n);

    let scale = Scale::new(m_min, m_max, t_min, t_max);
    let pts: Vec<Point> = data.iter().map(|d| scale.apply(d.0, d.1)).collect();
    let values: Vec<f64> = data.iter().map(|d| d.2).collect();
    let interp = Interpolant::new(pts, values)?;

    let vols = Array2::from_shape_fn((n, n), |(j, i)| {
        interp.eval(scale.apply(moneyness_axis[i], tenor_axis[j]))
    });
    let grid = Grid {
        moneyness_axis,
        tenor_axis,
        vols,
    };

    #[cfg(feature = "logging")]
    tracing::debug!(filled = grid.filled_cells(), total = n * n, "grid build complete");

    Ok(GridOutcome::Surface(grid))
}

/// Average the vols of points sharing identical coordinates; leaves `data`
/// sorted by (moneyness, tenor).
fn merge_coincident(data: &mut Vec<(f64, f64, f64)>) {
    data.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    let mut merged: Vec<(f64, f64, f64)> = Vec::with_capacity(data.len());
    let mut count = 0usize;
    for &(m, t, v) in data.iter() {
        match merged.last_mut() {
            Some(last) if last.0 == m && last.1 == t => {
                count += 1;
                last.2 += (v - last.2) / count as f64;
            }
            _ => {
                merged.push((m, t, v));
                count = 1;
            }
        }
    }
    *data = merged;
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// `n` evenly spaced values from `lo` to `hi` inclusive; endpoints exact.
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
        .collect()
}

/// Affine map of the data bounding box onto the unit square. A zero-width
/// axis maps to 0.
#[derive(Debug, Clone, Copy)]
struct Scale {
    m_min: f64,
    m_span: f64,
    t_min: f64,
    t_span: f64,
}

impl Scale {
    fn new(m_min: f64, m_max: f64, t_min: f64, t_max: f64) -> Self {
        Self {
            m_min,
            m_span: m_max - m_min,
            t_min,
            t_span: t_max - t_min,
        }
    }

    fn apply(&self, m: f64, t: f64) -> Point {
        let unit = |v: f64, lo: f64, span: f64| if span > 0.0 { (v - lo) / span } else { 0.0 };
        [unit(m, self.m_min, self.m_span), unit(t, self.t_min, self.t_span)]
    }
}

/// Interpolant chosen by the geometry of the (distinct) input points.
enum Interpolant {
    /// A single location: its value, everywhere it applies.
    Single { at: Point, value: f64 },
    /// Collinear points: spline in the arc-length parameter along the line.
    Line {
        origin: Point,
        dir: [f64; 2],
        spline: NaturalSpline,
    },
    /// General position: Clough-Tocher over a Delaunay triangulation.
    Surface(Box<CloughTocher>),
}

impl Interpolant {
    fn new(pts: Vec<Point>, values: Vec<f64>) -> crate::error::Result<Self> {
        let origin = pts[0];
        let far = pts
            .iter()
            .copied()
            .max_by(|a, b| dist2(origin, *a).total_cmp(&dist2(origin, *b)))
            .unwrap_or(origin);
        let len = dist2(origin, far).sqrt();
        if len == 0.0 {
            return Ok(Interpolant::Single {
                at: origin,
                value: values[0],
            });
        }

        let dir = [(far[0] - origin[0]) / len, (far[1] - origin[1]) / len];
        let off_line = |p: Point| (dir[0] * (p[1] - origin[1]) - dir[1] * (p[0] - origin[0])).abs();
        if pts.iter().all(|&p| off_line(p) <= COLLINEAR_EPS) {
            #[cfg(feature = "logging")]
            tracing::debug!(points = pts.len(), "collinear points, interpolating along a line");

            let along = |p: Point| dir[0] * (p[0] - origin[0]) + dir[1] * (p[1] - origin[1]);
            let mut pairs: Vec<(f64, f64)> = pts.iter().map(|&p| along(p)).zip(values).collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (s, v): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let spline = NaturalSpline::new(s, &v)?;
            return Ok(Interpolant::Line {
                origin,
                dir,
                spline,
            });
        }

        let tri = Triangulation::new(pts)?;
        Ok(Interpolant::Surface(Box::new(CloughTocher::new(tri, values)?)))
    }

    fn eval(&self, p: Point) -> Option<f64> {
        match self {
            Interpolant::Single { at, value } => (dist2(*at, p) <= COLLINEAR_EPS).then_some(*value),
            Interpolant::Line {
                origin,
                dir,
                spline,
            } => {
                let (dx, dy) = (p[0] - origin[0], p[1] - origin[1]);
                if (dir[0] * dy - dir[1] * dx).abs() > COLLINEAR_EPS {
                    return None;
                }
                let (s_lo, s_hi) = spline.range();
                let s = dir[0] * dx + dir[1] * dy;
                if s < s_lo - COLLINEAR_EPS || s > s_hi + COLLINEAR_EPS {
                    return None;
                }
                spline.eval(s.clamp(s_lo, s_hi))
            }
            Interpolant::Surface(ct) => ct.eval(p),
        }
    }
}

fn dist2(a: Point, b: Point) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Smile-shaped data on a few expiries.
    fn chain_like() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut m = Vec::new();
        let mut t = Vec::new();
        let mut v = Vec::new();
        for &tenor in &[0.1, 0.25, 0.5, 1.0] {
            for i in 0..9 {
                let k = 0.8 + 0.05 * i as f64;
                m.push(k);
                t.push(tenor);
                v.push(0.2 + 0.3 * (k - 1.0).powi(2) + 0.02 * tenor);
            }
        }
        (m, t, v)
    }

    fn surface(outcome: GridOutcome) -> Grid {
        outcome.into_surface().expect("expected a surface")
    }

    #[test]
    fn empty_input_is_no_points() {
        let out = interpolate_scattered(&[], &[], &[], &GridConfig::default()).unwrap();
        assert_eq!(out, GridOutcome::NoData(NoDataReason::NoPoints));
        assert!(interpolate(&[], &GridConfig::default()).unwrap().is_no_data());
    }

    #[test]
    fn everything_outside_band_is_filtered_out() {
        let out = interpolate_scattered(&[7.5, -8.0], &[0.5, 1.0], &[0.2, 0.3], &GridConfig::default())
            .unwrap();
        assert_eq!(out, GridOutcome::NoData(NoDataReason::AllFilteredOut));
    }

    #[test]
    fn band_edges_are_inclusive() {
        let out = interpolate_scattered(&[7.0], &[0.5], &[0.2], &GridConfig::with_resolution(3)).unwrap();
        let grid = surface(out);
        assert_eq!(grid.filled_cells(), 9);
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let out = interpolate_scattered(
            &[f64::NAN, 1.0],
            &[0.5, f64::INFINITY],
            &[0.2, 0.3],
            &GridConfig::default(),
        )
        .unwrap();
        assert_eq!(out, GridOutcome::NoData(NoDataReason::AllFilteredOut));
    }

    #[test]
    fn axes_span_the_data_with_exact_endpoints() {
        let (m, t, v) = chain_like();
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::default()).unwrap());
        assert_eq!(grid.moneyness_axis().len(), 50);
        assert_eq!(grid.tenor_axis().len(), 50);
        assert_eq!(grid.moneyness_axis()[0], 0.8);
        assert_eq!(*grid.moneyness_axis().last().unwrap(), 0.8 + 0.05 * 8.0);
        assert_eq!(grid.tenor_axis()[0], 0.1);
        assert_eq!(*grid.tenor_axis().last().unwrap(), 1.0);
        assert!(grid.moneyness_axis().windows(2).all(|w| w[1] > w[0]));
        assert_eq!(grid.vols().dim(), (50, 50));
    }

    #[test]
    fn rectangular_data_fills_every_node() {
        let (m, t, v) = chain_like();
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(20)).unwrap());
        assert_eq!(grid.filled_cells(), 400);
    }

    #[test]
    fn grid_nodes_on_data_reproduce_data() {
        let (m, t, v) = chain_like();
        // 9 moneyness knots at spacing 0.05 align with a 17-node axis.
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(17)).unwrap());
        let ti = 0; // tenor 0.1
        for i in 0..9 {
            let expected = 0.2 + 0.3 * (0.05 * i as f64 - 0.2).powi(2) + 0.002;
            assert_abs_diff_eq!(grid.get(ti, 2 * i).unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn interior_values_stay_close_to_smooth_data() {
        let (m, t, v) = chain_like();
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(25)).unwrap());
        for (j, &tenor) in grid.tenor_axis().iter().enumerate() {
            for (i, &k) in grid.moneyness_axis().iter().enumerate() {
                let truth = 0.2 + 0.3 * (k - 1.0).powi(2) + 0.02 * tenor;
                assert_abs_diff_eq!(grid.get(j, i).unwrap(), truth, epsilon = 3e-3);
            }
        }
    }

    #[test]
    fn outside_convex_hull_is_missing() {
        // Triangle of data: the grid's upper-right corner lies outside it.
        let m = [1.0, 2.0, 1.0];
        let t = [0.1, 0.1, 1.0];
        let v = [0.2, 0.25, 0.3];
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(5)).unwrap());
        assert!(grid.get(4, 4).is_none());
        assert!(grid.get(0, 0).is_some());
        assert!(grid.get(0, 4).is_some());
        assert!(grid.get(4, 0).is_some());
        assert!(grid.filled_cells() < 25);
    }

    #[test]
    fn single_expiry_interpolates_along_moneyness() {
        let m = [0.9, 1.0, 1.1, 1.2];
        let t = [0.5; 4];
        let v = [0.25, 0.2, 0.22, 0.26];
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(4)).unwrap());
        assert_eq!(grid.filled_cells(), 16);
        for j in 0..4 {
            for (i, expected) in v.iter().enumerate() {
                assert_abs_diff_eq!(grid.get(j, i).unwrap(), *expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn diagonal_collinear_points_leave_off_line_nodes_missing() {
        let m = [1.0, 1.5, 2.0];
        let t = [0.1, 0.55, 1.0];
        let v = [0.2, 0.25, 0.3];
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(3)).unwrap());
        for k in 0..3 {
            assert_abs_diff_eq!(grid.get(k, k).unwrap(), v[k], epsilon = 1e-9);
        }
        assert!(grid.get(0, 2).is_none());
        assert!(grid.get(2, 0).is_none());
    }

    #[test]
    fn single_point_fills_degenerate_grid() {
        let grid = surface(interpolate_scattered(&[1.1], &[0.3], &[0.27], &GridConfig::with_resolution(2)).unwrap());
        assert_eq!(grid.moneyness_axis(), &[1.1, 1.1]);
        assert_eq!(grid.get(1, 1), Some(0.27));
    }

    #[test]
    fn coincident_points_are_averaged() {
        let m = [1.0, 1.0, 2.0, 1.0];
        let t = [0.1, 0.1, 0.1, 1.0];
        let v = [0.2, 0.4, 0.25, 0.3];
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::with_resolution(2)).unwrap());
        assert_abs_diff_eq!(grid.get(0, 0).unwrap(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn out_of_band_points_do_not_shape_axes() {
        let m = [0.9, 1.1, 1.0, 50.0];
        let t = [0.2, 0.2, 0.8, 0.5];
        let v = [0.2, 0.2, 0.2, 9.0];
        let grid = surface(interpolate_scattered(&m, &t, &v, &GridConfig::default()).unwrap());
        assert_eq!(*grid.moneyness_axis().last().unwrap(), 1.1);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let err = interpolate_scattered(&[1.0], &[0.5, 0.6], &[0.2], &GridConfig::default());
        assert!(matches!(err, Err(IvSurfaceError::InvalidInput { .. })));
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(GridConfig::with_resolution(1).validate().is_err());
        let inverted = GridConfig {
            moneyness_band: (2.0, 1.0),
            ..GridConfig::default()
        };
        assert!(inverted.validate().is_err());
        assert!(interpolate_scattered(&[1.0], &[0.5], &[0.2], &inverted).is_err());
    }

    #[test]
    fn get_out_of_range_is_none() {
        let grid = surface(interpolate_scattered(&[1.0], &[0.5], &[0.2], &GridConfig::with_resolution(2)).unwrap());
        assert_eq!(grid.get(5, 0), None);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: GridConfig = serde_json::from_str(r#"{"resolution": 30}"#).unwrap();
        assert_eq!(cfg.resolution, 30);
        assert_eq!(cfg.moneyness_band, (-7.0, 7.0));
    }
}
