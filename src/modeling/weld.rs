// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerance-driven vertex welding

use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::{collapse_tiny_edges, grid_key, weld_sequential, UnionFind};
use crate::geometry::HalfEdgeMesh;
use crate::object::{Curve, Solid};
use crate::utils::math::{normalize_or, Vec3, EPSILON};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeldOptions {
    pub tolerance: f64,
    pub direction: Vec3,
    /// Scales the default directional window (`weight * tolerance * 2`)
    pub directional_weight: f64,
    /// Explicit limit on how far apart two welded vertices may sit along `direction`
    pub directional_window: Option<f64>,
}

impl Default for WeldOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            direction: Vec3::y(),
            directional_weight: 0.0,
            directional_window: None,
        }
    }
}

impl WeldOptions {
    pub fn window(&self) -> f64 {
        self.directional_window
            .unwrap_or_else(|| self.directional_weight.max(0.0) * self.tolerance * 2.0)
    }
}

pub struct Weld;

impl Weld {
    /// Merge the vertices of `solid` that lie within the tolerance.
    pub fn apply_solid(solid: &mut Solid, options: &WeldOptions) -> KernelResult<()> {
        if options.tolerance < 0.0 {
            return Err(KernelError::InvalidParameter(format!(
                "weld tolerance {} is negative",
                options.tolerance
            )));
        }
        let before = solid.mesh().vertex_count();
        weld_mesh(solid.mesh_mut(), options);
        debug!(before, after = solid.mesh().vertex_count(), "welded solid");
        solid.refresh_metadata();
        Ok(())
    }

    /// Weld consecutive curve points and collapse edges shorter than the tolerance.
    pub fn apply_curve(curve: &mut Curve, options: &WeldOptions) -> KernelResult<()> {
        let tolerance = options.tolerance.max(0.0);
        let points = collapse_tiny_edges(&weld_sequential(curve.boundary_loop(), tolerance), tolerance);
        if points.len() == curve.len() {
            return Ok(());
        }
        let hardness = curve.hardness_for(&points);
        debug!(before = curve.len(), after = points.len(), "welded curve");
        curve.rebuild_from_points(&points, Some(&hardness))
    }
}

/// Weld `mesh` in place.
///
/// With a directional window of ~0 this is a plain heal. Otherwise vertex
/// pairs within the tolerance whose offsets along the direction also fit the
/// window are clustered, snapped to the cluster centroid and then healed.
pub fn weld_mesh(mesh: &mut HalfEdgeMesh, options: &WeldOptions) {
    let tolerance = options.tolerance.max(0.0);
    let window = options.window();
    if window <= EPSILON {
        mesh.heal(tolerance, tolerance);
        return;
    }

    let direction = normalize_or(&options.direction, Vec3::y());
    let positions = mesh.positions();
    let count = positions.len();
    let mut clusters = UnionFind::new(count);
    let mut merges = 0usize;

    if tolerance > 0.0 {
        let tol_sq = tolerance * tolerance;
        let mut grid: AHashMap<(i64, i64, i64), Vec<usize>> = AHashMap::with_capacity(count);
        for (i, p) in positions.iter().enumerate() {
            let key = grid_key(p, tolerance);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(bucket) = grid.get(&(key.0 + dx, key.1 + dy, key.2 + dz)) else {
                            continue;
                        };
                        for &j in bucket {
                            let delta = positions[j] - p;
                            if delta.norm_squared() <= tol_sq
                                && delta.dot(&direction).abs() <= window
                                && clusters.union(i, j)
                            {
                                merges += 1;
                            }
                        }
                    }
                }
            }
            grid.entry(key).or_default().push(i);
        }
    }

    let mut sums = vec![(Vec3::zeros(), 0usize); count];
    for (i, p) in positions.iter().enumerate() {
        let root = clusters.find(i);
        sums[root].0 += p;
        sums[root].1 += 1;
    }
    for (i, vertex) in mesh.vertices_mut().iter_mut().enumerate() {
        let (sum, members) = sums[clusters.find(i)];
        vertex.position = sum / members as f64;
    }
    debug!(merges, window, "clustered weld candidates");
    // Snapped members coincide exactly; a wider heal would ignore the window.
    let snap = tolerance.min(EPSILON).max(1e-12);
    mesh.heal(snap, snap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    /// Two unit quads side by side whose shared edge is duplicated with a small gap.
    fn split_sheet(gap: f64) -> Solid {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0 + gap, 0.0, 0.0),
            Vec3::new(1.0 + gap, 0.0, 1.0),
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(2.0, 0.0, 0.0),
        ];
        let loops = vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]];
        Solid::create_from_mesh(HalfEdgeMesh::from_polygons(&positions, &loops).unwrap()).unwrap()
    }

    #[test]
    fn test_gap_within_tolerance_is_closed() {
        let mut solid = split_sheet(5e-5);
        Weld::apply_solid(&mut solid, &WeldOptions::default()).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 6);
        assert_eq!(solid.mesh().boundary_edge_count(), 6);
    }

    #[test]
    fn test_weld_is_idempotent() {
        let mut solid = split_sheet(5e-5);
        let options = WeldOptions::default();
        Weld::apply_solid(&mut solid, &options).unwrap();
        let once = solid.mesh().positions();
        Weld::apply_solid(&mut solid, &options).unwrap();
        assert_eq!(solid.mesh().positions(), once);
    }

    #[test]
    fn test_directional_window_blocks_merge() {
        let mut solid = split_sheet(5e-5);
        let options = WeldOptions {
            direction: Vec3::x(),
            directional_window: Some(2e-5),
            ..Default::default()
        };
        Weld::apply_solid(&mut solid, &options).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 8);

        let across = WeldOptions {
            direction: Vec3::z(),
            directional_window: Some(2e-5),
            ..Default::default()
        };
        Weld::apply_solid(&mut solid, &across).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 6);
        // cluster members meet halfway across the gap
        assert!(solid.mesh().vertices().iter().any(|v| (v.position.x - (1.0 + 2.5e-5)).abs() < 1e-12));
    }

    /// `n` quads stacked along Z on each side of a duplicated seam at x = 1.
    fn split_strip(n: usize, gap: f64) -> Solid {
        let mut positions = Vec::new();
        for x in [0.0, 1.0, 1.0 + gap, 2.0] {
            for z in 0..=n {
                positions.push(Vec3::new(x, 0.0, z as f64 * 0.1));
            }
        }
        let at = |column: usize, z: usize| column * (n + 1) + z;
        let mut loops = Vec::new();
        for z in 0..n {
            loops.push(vec![at(0, z), at(0, z + 1), at(1, z + 1), at(1, z)]);
            loops.push(vec![at(2, z), at(2, z + 1), at(3, z + 1), at(3, z)]);
        }
        Solid::create_from_mesh(HalfEdgeMesh::from_polygons(&positions, &loops).unwrap()).unwrap()
    }

    #[test]
    fn test_directional_weld_closes_long_seam() {
        let n = 60;
        let mut solid = split_strip(n, 5e-5);
        assert_eq!(solid.mesh().vertex_count(), 4 * (n + 1));
        let options = WeldOptions {
            direction: Vec3::z(),
            directional_window: Some(2e-5),
            ..Default::default()
        };
        Weld::apply_solid(&mut solid, &options).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 3 * (n + 1));
        // rows 0.1 apart never merge along the seam
        assert_eq!(solid.mesh().face_count(), 2 * n);
    }

    #[test]
    fn test_directional_weld_across_grid_cells() {
        let mut solid = split_sheet(5e-5);
        // the seam pair now straddles a spatial-hash cell boundary
        solid.translate(&Vec3::new(-2e-5, 0.0, 0.0));
        let options = WeldOptions {
            direction: Vec3::z(),
            directional_window: Some(2e-5),
            ..Default::default()
        };
        Weld::apply_solid(&mut solid, &options).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 6);
    }

    #[test]
    fn test_weld_never_grows_box() {
        let mut solid = Primitive::cube(1.0, 1.0, 1.0).to_solid(&Vec3::zeros()).unwrap();
        Weld::apply_solid(&mut solid, &WeldOptions::default()).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 8);
        assert!(solid.mesh().is_closed());
    }

    #[test]
    fn test_curve_weld_drops_near_duplicates() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0005),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let mut curve = Curve::create_from_points(&points, None).unwrap();
        let options = WeldOptions {
            tolerance: 1e-3,
            ..Default::default()
        };
        Weld::apply_curve(&mut curve, &options).unwrap();
        assert_eq!(curve.len(), 4);
        assert_eq!(curve.edge_hardness().len(), 4);
    }
}
