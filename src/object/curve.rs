// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed planar-ish profile stored as a single manifold face

use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::{polygon_normal, sanitize_loop};
use crate::geometry::transform::{rotate_about_axis, scale_from_pivot};
use crate::geometry::HalfEdgeMesh;
use crate::utils::math::{Vec3, EPSILON};

/// Closed boundary loop with one hardness tag per loop point
#[derive(Debug, Clone)]
pub struct Curve {
    boundary_loop: Vec<Vec3>,
    hardness: Vec<bool>,
    mesh: HalfEdgeMesh,
    /// Tolerances the curve was created with; rebuilds reuse them
    config: KernelConfig,
}

impl Curve {
    /// Sanitize `points` into a closed loop and wrap it in a one-face mesh.
    ///
    /// `hardness` is matched to the input by index; missing entries are soft.
    pub fn create_from_points(points: &[Vec3], hardness: Option<&[bool]>) -> KernelResult<Self> {
        Self::create_with_config(points, hardness, &KernelConfig::default())
    }

    pub fn create_with_config(points: &[Vec3], hardness: Option<&[bool]>, config: &KernelConfig) -> KernelResult<Self> {
        let (boundary_loop, hardness, mesh) = build_loop(points, hardness, config)?;
        Ok(Self {
            boundary_loop,
            hardness,
            mesh,
            config: *config,
        })
    }

    /// Replace the loop in place; on error the curve is left untouched.
    ///
    /// Sanitizing uses the tolerances the curve was created with.
    pub fn rebuild_from_points(&mut self, points: &[Vec3], hardness: Option<&[bool]>) -> KernelResult<()> {
        let (boundary_loop, hardness, mesh) = build_loop(points, hardness, &self.config)?;
        self.boundary_loop = boundary_loop;
        self.hardness = hardness;
        self.mesh = mesh;
        Ok(())
    }

    pub fn boundary_loop(&self) -> &[Vec3] {
        &self.boundary_loop
    }

    pub fn edge_hardness(&self) -> &[bool] {
        &self.hardness
    }

    /// Hardness of each of `points` that is one of this curve's loop points; others are soft.
    pub fn hardness_for(&self, points: &[Vec3]) -> Vec<bool> {
        points
            .iter()
            .map(|p| {
                self.boundary_loop
                    .iter()
                    .position(|q| q == p)
                    .and_then(|i| self.hardness.get(i).copied())
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    pub fn len(&self) -> usize {
        self.boundary_loop.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundary_loop.is_empty()
    }

    /// Unit normal of the loop by Newell's method.
    pub fn normal(&self) -> Vec3 {
        polygon_normal(&self.boundary_loop)
    }

    /// Overwrite the hardness tags; the array is resized to the loop length.
    pub fn set_edge_hardness(&mut self, mut hardness: Vec<bool>) {
        hardness.resize(self.boundary_loop.len(), false);
        self.hardness = hardness;
    }

    pub fn tag_all_edges_hard(&mut self, hard: bool) {
        self.hardness = vec![hard; self.boundary_loop.len()];
    }

    /// Move every loop point through `f`, keeping the topology.
    pub fn apply_transform(&mut self, f: impl Fn(&Vec3) -> Vec3) {
        for p in &mut self.boundary_loop {
            *p = f(p);
        }
        for (vertex, p) in self.mesh.vertices_mut().iter_mut().zip(&self.boundary_loop) {
            vertex.position = *p;
        }
        self.mesh.recompute_normals();
    }

    pub fn translate(&mut self, delta: &Vec3) {
        self.apply_transform(|p| p + delta);
    }

    pub fn rotate(&mut self, pivot: &Vec3, axis: &Vec3, radians: f64) {
        self.apply_transform(|p| rotate_about_axis(p, pivot, axis, radians));
    }

    pub fn scale(&mut self, pivot: &Vec3, factors: &Vec3) {
        self.apply_transform(|p| scale_from_pivot(p, pivot, factors));
    }
}

fn build_loop(
    points: &[Vec3],
    hardness: Option<&[bool]>,
    config: &KernelConfig,
) -> KernelResult<(Vec<Vec3>, Vec<bool>, HalfEdgeMesh)> {
    let kept = sanitize_loop(points, config.weld_epsilon, config.min_edge_length);
    if kept.len() < 3 {
        return Err(KernelError::TooFewPoints {
            required: 3,
            found: kept.len(),
        });
    }

    let mut boundary: Vec<Vec3> = kept.iter().map(|&i| points[i]).collect();
    let mut flags: Vec<bool> = kept
        .iter()
        .map(|&i| hardness.and_then(|h| h.get(i).copied()).unwrap_or(false))
        .collect();

    // Horizontal loops face up.
    if polygon_normal(&boundary).y < -EPSILON {
        boundary.reverse();
        flags.reverse();
    }

    let face: Vec<usize> = (0..boundary.len()).collect();
    let mesh = HalfEdgeMesh::from_polygons(&boundary, &[face])?;
    if !mesh.is_manifold() {
        return Err(KernelError::NonManifold);
    }
    Ok((boundary, flags, mesh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_empty_curve_rejected() {
        assert!(matches!(
            Curve::create_from_points(&[], None),
            Err(KernelError::TooFewPoints { found: 0, .. })
        ));
    }

    #[test]
    fn test_noisy_square_becomes_single_face() {
        let mut noisy = square();
        noisy.insert(2, Vec3::new(1.0, 0.0, 1e-5));
        noisy.push(Vec3::new(0.0, 0.0, 1e-6));
        let curve = Curve::create_from_points(&noisy, None).unwrap();

        assert_eq!(curve.len(), 4);
        assert_eq!(curve.mesh().face_count(), 1);
        assert_eq!(curve.mesh().triangles().len(), 2);
        assert!(curve.mesh().faces()[0].normal.y > 0.9);
        assert_eq!(curve.edge_hardness().len(), 4);
    }

    #[test]
    fn test_hardness_follows_surviving_points() {
        let curve = Curve::create_from_points(&square(), Some(&[true, false, true])).unwrap();
        let hard = curve.edge_hardness().iter().filter(|h| **h).count();
        assert_eq!(hard, 2);
    }

    #[test]
    fn test_failed_rebuild_keeps_curve() {
        let mut curve = Curve::create_from_points(&square(), None).unwrap();
        let before = curve.boundary_loop().to_vec();
        assert!(curve.rebuild_from_points(&square()[..2], None).is_err());
        assert_eq!(curve.boundary_loop(), before.as_slice());
    }

    #[test]
    fn test_rebuild_keeps_creation_tolerances() {
        let config = KernelConfig {
            weld_epsilon: 1e-2,
            min_edge_length: 1e-2,
            ..KernelConfig::default()
        };
        let mut curve = Curve::create_with_config(&square(), None, &config).unwrap();
        let mut noisy = square();
        noisy.insert(2, Vec3::new(1.0, 0.0, 0.005));
        curve.rebuild_from_points(&noisy, None).unwrap();
        assert_eq!(curve.len(), 4);

        let mut loose = Curve::create_from_points(&square(), None).unwrap();
        loose.rebuild_from_points(&noisy, None).unwrap();
        assert_eq!(loose.len(), 5);
    }

    #[test]
    fn test_hardness_for_matches_positions() {
        let mut curve = Curve::create_from_points(&square(), None).unwrap();
        curve.tag_all_edges_hard(true);
        let queried = [square()[1], Vec3::new(0.5, 0.0, 0.5)];
        assert_eq!(curve.hardness_for(&queried), vec![true, false]);
    }

    #[test]
    fn test_translate_moves_mesh() {
        let mut curve = Curve::create_from_points(&square(), None).unwrap();
        curve.translate(&Vec3::new(0.0, 2.0, 0.0));
        for (p, v) in curve.boundary_loop().iter().zip(curve.mesh().vertices()) {
            assert_relative_eq!(p.y, 2.0);
            assert_relative_eq!(*p, v.position);
        }
        curve.tag_all_edges_hard(true);
        assert!(curve.edge_hardness().iter().all(|h| *h));
    }
}
