// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon preprocessing and small geometric queries

use crate::utils::math::{Vec3, EPSILON};

/// Undirected edge key with the smaller index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub v0: usize,
    pub v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

/// Disjoint-set forest whose roots are always the smallest member index.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

/// Spatial-hash cell of `p` for buckets of edge length `cell`.
pub(crate) fn grid_key(p: &Vec3, cell: f64) -> (i64, i64, i64) {
    (
        (p.x / cell).floor() as i64,
        (p.y / cell).floor() as i64,
        (p.z / cell).floor() as i64,
    )
}

impl UnionFind {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi] = lo;
        true
    }
}

/// Unnormalized Newell vector; its length is twice the polygon area.
pub fn newell_vector(polygon: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::zeros();
    if polygon.len() < 3 {
        return normal;
    }
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// Unit polygon normal by Newell's method, zero for degenerate input.
pub fn polygon_normal(polygon: &[Vec3]) -> Vec3 {
    let n = newell_vector(polygon);
    let len = n.norm();
    if len <= 1e-12 {
        Vec3::zeros()
    } else {
        n / len
    }
}

/// Area of a (possibly non-planar) polygon.
pub fn polygon_area(polygon: &[Vec3]) -> f64 {
    newell_vector(polygon).norm() * 0.5
}

/// Unit normal of a triangle, zero when it is degenerate.
pub fn triangle_normal(a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let n = (b - a).cross(&(c - a));
    if n.norm_squared() <= 1e-16 {
        Vec3::zeros()
    } else {
        n.normalize()
    }
}

/// Indices of the points that survive sequential welding and tiny-edge collapse.
///
/// Consecutive points closer than `weld_epsilon` are merged into the first,
/// a trailing point that duplicates the first is dropped, and then any edge
/// shorter than `min_edge` loses its end point until none remain.
pub fn sanitize_loop(points: &[Vec3], weld_epsilon: f64, min_edge: f64) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(points.len());
    let weld_sq = weld_epsilon * weld_epsilon;
    for (i, p) in points.iter().enumerate() {
        match kept.last() {
            Some(&last) if (points[last] - p).norm_squared() <= weld_sq => {}
            _ => kept.push(i),
        }
    }
    if kept.len() > 1 && (points[kept[0]] - points[kept[kept.len() - 1]]).norm_squared() <= weld_sq {
        kept.pop();
    }

    let min_sq = min_edge * min_edge;
    let mut changed = true;
    while changed && kept.len() >= 3 {
        changed = false;
        for i in 0..kept.len() {
            let j = (i + 1) % kept.len();
            if (points[kept[i]] - points[kept[j]]).norm_squared() < min_sq {
                kept.remove(j);
                changed = true;
                break;
            }
        }
    }
    kept
}

/// Merge consecutive near-duplicate points and drop a closing duplicate.
pub fn weld_sequential(points: &[Vec3], epsilon: f64) -> Vec<Vec3> {
    sanitize_loop(points, epsilon, 0.0)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Remove loop points that sit closer than `min_edge` to their predecessor.
pub fn collapse_tiny_edges(points: &[Vec3], min_edge: f64) -> Vec<Vec3> {
    if points.len() < 3 {
        return points.to_vec();
    }
    sanitize_loop(points, 0.0, min_edge)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Closest point to `p` on segment `a..b`.
pub fn closest_point_on_segment(p: &Vec3, a: &Vec3, b: &Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= EPSILON * EPSILON {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point to `p` on triangle `abc` (region tests on barycentric coordinates).
pub fn closest_point_on_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Shortest distance from `p` to an open polyline.
pub fn distance_to_polyline(p: &Vec3, polyline: &[Vec3]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [only] => (p - only).norm(),
        _ => polyline
            .windows(2)
            .map(|w| (p - closest_point_on_segment(p, &w[0], &w[1])).norm())
            .fold(f64::INFINITY, f64::min),
    }
}
