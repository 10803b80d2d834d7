//! Clough-Tocher C1 piecewise-cubic interpolation over a triangulation.
//!
//! Each triangle is split at its centroid into three cubic Bézier patches.
//! Control points come from the vertex values, vertex gradients and a
//! cross-boundary derivative condition shared with the neighbouring
//! triangle, which makes the interpolant C1 across edges.
//!
//! Vertex gradients are estimated by inverse-distance-weighted least squares
//! over each vertex's Delaunay neighbours, which reproduces linear data
//! exactly.
//!
//! # References
//! - Clough, R.W., Tocher, J.L. "Finite element stiffness matrices for
//!   analysis of plates in bending" (1965)
//! - Farin, G. "Triangular Bernstein-Bézier patches" (1986)

use nalgebra::{Matrix2, Vector2};

use crate::error::IvSurfaceError;
use crate::grid::delaunay::{Point, Triangulation};

/// Cubic C1 interpolant of scattered values.
#[derive(Debug, Clone)]
pub(crate) struct CloughTocher {
    tri: Triangulation,
    values: Vec<f64>,
    gradients: Vec<[f64; 2]>,
}

impl CloughTocher {
    /// Build the interpolant from a triangulation and one value per vertex.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] if `values` does not match
    /// the vertex count.
    pub(crate) fn new(tri: Triangulation, values: Vec<f64>) -> crate::error::Result<Self> {
        if values.len() != tri.points().len() {
            return Err(IvSurfaceError::InvalidInput {
                message: format!(
                    "expected {} vertex values, got {}",
                    tri.points().len(),
                    values.len()
                ),
            });
        }
        let gradients = estimate_gradients(&tri, &values);
        Ok(Self {
            tri,
            values,
            gradients,
        })
    }

    /// Interpolated value at `p`, or `None` outside the convex hull.
    pub(crate) fn eval(&self, p: Point) -> Option<f64> {
        let (t, b) = self.tri.locate(p)?;
        let v = self.eval_in(t, b);
        v.is_finite().then_some(v)
    }

    fn eval_in(&self, t: usize, b: [f64; 3]) -> f64 {
        let [i0, i1, i2] = self.tri.triangles()[t];
        let pts = self.tri.points();
        let (p0, p1, p2) = (pts[i0], pts[i1], pts[i2]);
        let (f1, f2, f3) = (self.values[i0], self.values[i1], self.values[i2]);
        let (g0, g1, g2) = (self.gradients[i0], self.gradients[i1], self.gradients[i2]);

        let e12 = [p1[0] - p0[0], p1[1] - p0[1]];
        let e23 = [p2[0] - p1[0], p2[1] - p1[1]];
        let e31 = [p0[0] - p2[0], p0[1] - p2[1]];
        let dot = |g: [f64; 2], e: [f64; 2]| g[0] * e[0] + g[1] * e[1];

        // Directional derivatives along the edges, from each end.
        let df12 = dot(g0, e12);
        let df21 = -dot(g1, e12);
        let df23 = dot(g1, e23);
        let df32 = -dot(g2, e23);
        let df31 = dot(g2, e31);
        let df13 = -dot(g0, e31);

        let c3000 = f1;
        let c2100 = (df12 + 3.0 * c3000) / 3.0;
        let c2010 = (df13 + 3.0 * c3000) / 3.0;
        let c0300 = f2;
        let c1200 = (df21 + 3.0 * c0300) / 3.0;
        let c0210 = (df23 + 3.0 * c0300) / 3.0;
        let c0030 = f3;
        let c1020 = (df31 + 3.0 * c0030) / 3.0;
        let c0120 = (df32 + 3.0 * c0030) / 3.0;

        let c2001 = (c2100 + c2010 + c3000) / 3.0;
        let c0201 = (c1200 + c0300 + c0210) / 3.0;
        let c0021 = (c1020 + c0120 + c0030) / 3.0;

        let g = self.cross_boundary_weights(t);

        let c0111 = (g[0] * (-c0300 + 3.0 * c0210 - 3.0 * c0120 + c0030)
            + (-c0300 + 2.0 * c0210 - c0120 + c0021 + c0201))
            / 2.0;
        let c1011 = (g[1] * (-c0030 + 3.0 * c1020 - 3.0 * c2010 + c3000)
            + (-c0030 + 2.0 * c1020 - c2010 + c2001 + c0021))
            / 2.0;
        let c1101 = (g[2] * (-c3000 + 3.0 * c2100 - 3.0 * c1200 + c0300)
            + (-c3000 + 2.0 * c2100 - c1200 + c2001 + c0201))
            / 2.0;

        let c1002 = (c1101 + c1011 + c2001) / 3.0;
        let c0102 = (c1101 + c0111 + c0201) / 3.0;
        let c0012 = (c1011 + c0111 + c0021) / 3.0;
        let c0003 = (c1002 + c0102 + c0012) / 3.0;

        // Barycentric coordinates in the micro-triangle containing the point;
        // the fourth vertex is the centroid.
        let minval = b[0].min(b[1]).min(b[2]);
        let b1 = b[0] - minval;
        let b2 = b[1] - minval;
        let b3 = b[2] - minval;
        let b4 = 3.0 * minval;

        b1.powi(3) * c3000
            + 3.0 * b1 * b1 * b2 * c2100
            + 3.0 * b1 * b1 * b3 * c2010
            + 3.0 * b1 * b1 * b4 * c2001
            + 3.0 * b1 * b2 * b2 * c1200
            + 6.0 * b1 * b2 * b4 * c1101
            + 3.0 * b1 * b3 * b3 * c1020
            + 6.0 * b1 * b3 * b4 * c1011
            + 3.0 * b1 * b4 * b4 * c1002
            + b2.powi(3) * c0300
            + 3.0 * b2 * b2 * b3 * c0210
            + 3.0 * b2 * b2 * b4 * c0201
            + 3.0 * b2 * b3 * b3 * c0120
            + 6.0 * b2 * b3 * b4 * c0111
            + 3.0 * b2 * b4 * b4 * c0102
            + b3.powi(3) * c0030
            + 3.0 * b3 * b3 * b4 * c0021
            + 3.0 * b3 * b4 * b4 * c0012
            + b4.powi(3) * c0003
    }

    /// Weights of the C1 condition across each edge (opposite vertex k),
    /// derived from the neighbour's centroid in this triangle's barycentric
    /// frame. Hull edges use -1/2.
    fn cross_boundary_weights(&self, t: usize) -> [f64; 3] {
        let mut g = [-0.5; 3];
        for (k, nb) in self.tri.neighbors(t).into_iter().enumerate() {
            let Some(nb) = nb else { continue };
            let [a, b, c] = self.tri.triangles()[nb];
            let pts = self.tri.points();
            let centroid = [
                (pts[a][0] + pts[b][0] + pts[c][0]) / 3.0,
                (pts[a][1] + pts[b][1] + pts[c][1]) / 3.0,
            ];
            let l = self.tri.barycentric(t, centroid);
            let (num, den) = match k {
                0 => (2.0 * l[2] + l[1] - 1.0, 2.0 - 3.0 * l[2] - 3.0 * l[1]),
                1 => (2.0 * l[0] + l[2] - 1.0, 2.0 - 3.0 * l[0] - 3.0 * l[2]),
                _ => (2.0 * l[1] + l[0] - 1.0, 2.0 - 3.0 * l[1] - 3.0 * l[0]),
            };
            let w = num / den;
            if w.is_finite() {
                g[k] = w;
            }
        }
        g
    }
}

/// Per-vertex gradient by weighted least squares over Delaunay neighbours:
/// minimise Σ wⱼ (fⱼ − fᵢ − ∇f·dⱼ)² with wⱼ = 1/|dⱼ|².
fn estimate_gradients(tri: &Triangulation, values: &[f64]) -> Vec<[f64; 2]> {
    let pts = tri.points();
    tri.vertex_neighbors()
        .iter()
        .enumerate()
        .map(|(i, nbrs)| {
            let mut normal = Matrix2::<f64>::zeros();
            let mut rhs = Vector2::<f64>::zeros();
            for &j in nbrs {
                let d = Vector2::new(pts[j][0] - pts[i][0], pts[j][1] - pts[i][1]);
                let dist2 = d.norm_squared();
                if dist2 == 0.0 {
                    continue;
                }
                let w = 1.0 / dist2;
                normal += w * d * d.transpose();
                rhs += w * (values[j] - values[i]) * d;
            }
            match normal.try_inverse() {
                Some(inv) => {
                    let g = inv * rhs;
                    if g.iter().all(|v| v.is_finite()) {
                        [g[0], g[1]]
                    } else {
                        [0.0, 0.0]
                    }
                }
                None => [0.0, 0.0],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scattered(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let a = i as f64 * 2.399_963;
                let r = ((i as f64 + 0.5) / n as f64).sqrt();
                [0.5 + 0.5 * r * a.cos(), 0.5 + 0.5 * r * a.sin()]
            })
            .collect()
    }

    fn build(pts: Vec<Point>, f: impl Fn(Point) -> f64) -> CloughTocher {
        let values = pts.iter().map(|&p| f(p)).collect();
        let tri = Triangulation::new(pts).unwrap();
        CloughTocher::new(tri, values).unwrap()
    }

    #[test]
    fn reproduces_vertex_values() {
        let pts = scattered(30);
        let f = |p: Point| (3.0 * p[0]).sin() + p[1] * p[1];
        let ct = build(pts.clone(), f);
        for p in pts {
            assert_abs_diff_eq!(ct.eval(p).unwrap(), f(p), epsilon = 1e-9);
        }
    }

    #[test]
    fn reproduces_linear_functions_exactly() {
        let f = |p: Point| 0.2 + 0.5 * p[0] - 0.3 * p[1];
        let ct = build(scattered(40), f);
        for q in [[0.5, 0.5], [0.4, 0.6], [0.55, 0.35], [0.62, 0.48]] {
            assert_abs_diff_eq!(ct.eval(q).unwrap(), f(q), epsilon = 1e-9);
        }
    }

    #[test]
    fn smooth_function_is_approximated() {
        let f = |p: Point| 0.2 + 0.1 * (p[0] - 0.5).powi(2) + 0.05 * p[1];
        let ct = build(scattered(200), f);
        for q in [[0.5, 0.5], [0.3, 0.6], [0.7, 0.4]] {
            assert_abs_diff_eq!(ct.eval(q).unwrap(), f(q), epsilon = 1e-3);
        }
    }

    #[test]
    fn outside_hull_is_none() {
        let ct = build(scattered(20), |p| p[0]);
        assert!(ct.eval([2.0, 2.0]).is_none());
        assert!(ct.eval([-0.5, 0.5]).is_none());
    }

    #[test]
    fn value_count_must_match() {
        let tri = Triangulation::new(scattered(10)).unwrap();
        assert!(CloughTocher::new(tri, vec![0.0; 9]).is_err());
    }

    #[test]
    fn gradients_exact_for_planes() {
        let pts = scattered(25);
        let values: Vec<f64> = pts.iter().map(|p| 1.0 + 2.0 * p[0] - 4.0 * p[1]).collect();
        let tri = Triangulation::new(pts).unwrap();
        for g in estimate_gradients(&tri, &values) {
            assert_abs_diff_eq!(g[0], 2.0, epsilon = 1e-9);
            assert_abs_diff_eq!(g[1], -4.0, epsilon = 1e-9);
        }
    }
}
