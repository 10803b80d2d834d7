//! Delaunay triangulation of scattered 2-D points.
//!
//! Points are swept in lexicographic order: each new point lies outside the
//! current hull and is joined to every hull edge it can see. The result
//! already covers the convex hull exactly; Lawson edge flips then restore the
//! empty-circumcircle property without changing the covered region.
//!
//! Callers are expected to pass distinct points scaled to roughly unit size.
//! Construction is O(n²) in the worst case, which is ample for option-chain
//! sized inputs.

use std::collections::HashMap;

use crate::error::IvSurfaceError;

/// In-circle determinant above which an edge is flipped. Co-circular
/// quadrilaterals sit at zero and are left alone.
const IN_CIRCLE_EPS: f64 = 1e-12;

/// Barycentric tolerance when locating points on triangle edges.
const LOCATE_EPS: f64 = 1e-10;

pub(crate) type Point = [f64; 2];

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
pub(crate) fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `d` lies strictly inside the circumcircle of CCW (a, b, c).
fn in_circle(a: Point, b: Point, c: Point, d: Point) -> f64 {
    let (adx, ady) = (a[0] - d[0], a[1] - d[1]);
    let (bdx, bdy) = (b[0] - d[0], b[1] - d[1]);
    let (cdx, cdy) = (c[0] - d[0], c[1] - d[1]);
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;
    adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx)
}

/// A Delaunay triangulation with triangle adjacency.
///
/// Triangles are stored counter-clockwise. `neighbors[t][k]` is the triangle
/// across the edge opposite vertex `k` of triangle `t`, or `None` on the hull.
#[derive(Debug, Clone)]
pub(crate) struct Triangulation {
    points: Vec<Point>,
    triangles: Vec<[usize; 3]>,
    neighbors: Vec<[Option<usize>; 3]>,
}

impl Triangulation {
    /// Triangulate `points`.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] for fewer than three points or
    /// non-finite coordinates, and [`IvSurfaceError::NumericalError`] if all
    /// points are collinear.
    pub(crate) fn new(points: Vec<Point>) -> crate::error::Result<Self> {
        let n = points.len();
        if n < 3 {
            return Err(IvSurfaceError::InvalidInput {
                message: format!("triangulation requires at least 3 points, got {n}"),
            });
        }
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(IvSurfaceError::InvalidInput {
                message: "triangulation points must be finite".into(),
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            points[a][0]
                .total_cmp(&points[b][0])
                .then(points[a][1].total_cmp(&points[b][1]))
        });

        let (mut tris, mut hull, next) = seed_fan(&points, &order)?;
        for &p in &order[next..] {
            attach(&points, &mut tris, &mut hull, p);
        }
        legalize(&points, &mut tris);

        let neighbors = adjacency(&tris);
        Ok(Self {
            points,
            triangles: tris,
            neighbors,
        })
    }

    pub(crate) fn points(&self) -> &[Point] {
        &self.points
    }

    pub(crate) fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub(crate) fn neighbors(&self, tri: usize) -> [Option<usize>; 3] {
        self.neighbors[tri]
    }

    /// Barycentric coordinates of `p` with respect to triangle `tri`.
    pub(crate) fn barycentric(&self, tri: usize, p: Point) -> [f64; 3] {
        let [i, j, k] = self.triangles[tri];
        let (a, b, c) = (self.points[i], self.points[j], self.points[k]);
        let area = orient(a, b, c);
        let l0 = orient(p, b, c) / area;
        let l1 = orient(a, p, c) / area;
        [l0, l1, 1.0 - l0 - l1]
    }

    /// Triangle containing `p` and its barycentric coordinates, or `None`
    /// outside the convex hull.
    pub(crate) fn locate(&self, p: Point) -> Option<(usize, [f64; 3])> {
        (0..self.triangles.len()).find_map(|t| {
            let b = self.barycentric(t, p);
            b.iter().all(|&l| l >= -LOCATE_EPS).then_some((t, b))
        })
    }

    /// Distinct vertices sharing an edge with each vertex.
    pub(crate) fn vertex_neighbors(&self) -> Vec<Vec<usize>> {
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); self.points.len()];
        for t in &self.triangles {
            for k in 0..3 {
                let (u, v) = (t[k], t[(k + 1) % 3]);
                if !adj[u].contains(&v) {
                    adj[u].push(v);
                }
                if !adj[v].contains(&u) {
                    adj[v].push(u);
                }
            }
        }
        adj
    }
}

/// Fan the leading run of collinear points (in sweep order) to the first
/// point off their line. Returns the triangles, the CCW hull and the sweep
/// position of the next point to attach.
fn seed_fan(
    points: &[Point],
    order: &[usize],
) -> crate::error::Result<(Vec<[usize; 3]>, Vec<usize>, usize)> {
    let (a, b) = (points[order[0]], points[order[1]]);
    let Some(apex) = (2..order.len()).find(|&k| orient(a, b, points[order[k]]) != 0.0) else {
        return Err(IvSurfaceError::NumericalError {
            message: "triangulation is empty; points are collinear".into(),
        });
    };
    let p = order[apex];
    let mut chain = order[..apex].to_vec();
    if orient(a, b, points[p]) < 0.0 {
        chain.reverse();
    }

    let tris = chain.windows(2).map(|w| [w[0], w[1], p]).collect();
    chain.push(p);
    Ok((tris, chain, apex + 1))
}

/// Join `p`, which lies outside the hull, to every hull edge it sees and
/// splice it into the hull.
fn attach(points: &[Point], tris: &mut Vec<[usize; 3]>, hull: &mut Vec<usize>, p: usize) {
    let h = hull.len();
    let d = points[p];
    let visible: Vec<bool> = (0..h)
        .map(|i| orient(points[hull[i]], points[hull[(i + 1) % h]], d) < 0.0)
        .collect();
    // Duplicates see no edge and are skipped.
    let Some(start) = (0..h).find(|&i| visible[i] && !visible[(i + h - 1) % h]) else {
        return;
    };

    let mut seen = 0;
    while seen < h && visible[(start + seen) % h] {
        let (a, b) = (hull[(start + seen) % h], hull[(start + seen + 1) % h]);
        tris.push([b, a, p]);
        seen += 1;
    }

    let mut spliced = Vec::with_capacity(h + 2 - seen);
    spliced.push(hull[start]);
    spliced.push(p);
    spliced.extend((seen..h).map(|i| hull[(start + i) % h]));
    *hull = spliced;
}

/// Lawson flips: replace the shared edge of any pair of triangles whose
/// opposite vertex falls inside the other's circumcircle, until none remain.
/// Flips never change the covered region.
fn legalize(points: &[Point], tris: &mut [[usize; 3]]) {
    let max_passes = tris.len() * tris.len() + 1;
    for _ in 0..max_passes {
        let neighbors = adjacency(tris);
        let mut touched = vec![false; tris.len()];
        let mut flipped = false;
        for t in 0..tris.len() {
            if touched[t] {
                continue;
            }
            for k in 0..3 {
                let Some(u) = neighbors[t][k] else { continue };
                if touched[u] {
                    continue;
                }
                let (a, b, c) = (tris[t][k], tris[t][(k + 1) % 3], tris[t][(k + 2) % 3]);
                let Some(d) = tris[u].iter().copied().find(|&v| v != b && v != c) else {
                    continue;
                };
                let (pa, pb, pc, pd) = (points[a], points[b], points[c], points[d]);
                if in_circle(pa, pb, pc, pd) > IN_CIRCLE_EPS
                    && orient(pa, pb, pd) > 0.0
                    && orient(pa, pd, pc) > 0.0
                {
                    tris[t] = [a, b, d];
                    tris[u] = [a, d, c];
                    touched[t] = true;
                    touched[u] = true;
                    flipped = true;
                    break;
                }
            }
        }
        if !flipped {
            return;
        }
    }
}

/// Triangle adjacency: neighbour across the edge opposite each vertex.
fn adjacency(tris: &[[usize; 3]]) -> Vec<[Option<usize>; 3]> {
    let mut edges: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
    for (ti, t) in tris.iter().enumerate() {
        for k in 0..3 {
            let (u, v) = (t[(k + 1) % 3], t[(k + 2) % 3]);
            edges.entry((u.min(v), u.max(v))).or_default().push((ti, k));
        }
    }
    let mut neighbors = vec![[None; 3]; tris.len()];
    for shared in edges.values() {
        if let [(t0, k0), (t1, k1)] = shared[..] {
            neighbors[t0][k0] = Some(t1);
            neighbors[t1][k1] = Some(t0);
        }
    }
    neighbors
}
