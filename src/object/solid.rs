// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Volumetric object backed by a manifold half-edge mesh

use super::Curve;
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::{polygon_normal, sanitize_loop};
use crate::geometry::transform::{rotate_about_axis, scale_from_pivot};
use crate::geometry::HalfEdgeMesh;
use crate::utils::math::{centroid, Vec3};
use tracing::debug;

/// Vertices within this height of the lowest point form the synthetic base ring.
const BASE_RING_TOLERANCE: f64 = 1e-3;

/// Solid mesh plus the profile it was (or may have been) extruded from
#[derive(Debug, Clone)]
pub struct Solid {
    mesh: HalfEdgeMesh,
    base_loop: Vec<Vec3>,
    height: f64,
}

impl Solid {
    /// Extrude a closed profile along `extrude` with optional end caps.
    pub fn create_from_profile(points: &[Vec3], extrude: &Vec3, cap_start: bool, cap_end: bool) -> KernelResult<Self> {
        Self::create_from_profile_with(points, extrude, cap_start, cap_end, &KernelConfig::default())
    }

    pub fn create_from_profile_with(
        points: &[Vec3],
        extrude: &Vec3,
        cap_start: bool,
        cap_end: bool,
        config: &KernelConfig,
    ) -> KernelResult<Self> {
        let kept = sanitize_loop(points, config.weld_epsilon, config.min_edge_length);
        if kept.len() < 3 {
            return Err(KernelError::TooFewPoints {
                required: 3,
                found: kept.len(),
            });
        }
        let length = extrude.norm();
        if length < config.min_extrusion {
            return Err(KernelError::DegenerateVector("extrusion vector"));
        }

        let mut base: Vec<Vec3> = kept.iter().map(|&i| points[i]).collect();
        if polygon_normal(&base).dot(extrude) < 0.0 {
            base.reverse();
        }

        let n = base.len();
        let mut positions = base.clone();
        positions.extend(base.iter().map(|p| p + extrude));

        let mut loops: Vec<Vec<usize>> = Vec::with_capacity(n + 2);
        if cap_start {
            loops.push((0..n).rev().collect());
        }
        if cap_end {
            loops.push((n..2 * n).collect());
        }
        for i in 0..n {
            let j = (i + 1) % n;
            loops.push(vec![i, j, n + j, n + i]);
        }

        let mut mesh = HalfEdgeMesh::from_polygons(&positions, &loops)?;
        mesh.heal(config.heal_tolerance, config.heal_tolerance);
        if mesh.face_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }
        if !mesh.is_manifold() {
            return Err(KernelError::NonManifold);
        }
        debug!(profile = n, faces = mesh.face_count(), height = length, "extruded profile");
        Ok(Self {
            mesh,
            base_loop: base,
            height: length,
        })
    }

    /// Extrude a curve straight up by `height`.
    pub fn create_from_curve(curve: &Curve, height: f64) -> KernelResult<Self> {
        Self::create_from_profile(curve.boundary_loop(), &(Vec3::y() * height), true, true)
    }

    /// Heal and validate an arbitrary mesh, deriving advisory base metadata.
    pub fn create_from_mesh(mesh: HalfEdgeMesh) -> KernelResult<Self> {
        Self::create_from_mesh_with(mesh, &KernelConfig::default())
    }

    pub fn create_from_mesh_with(mut mesh: HalfEdgeMesh, config: &KernelConfig) -> KernelResult<Self> {
        mesh.heal(config.heal_tolerance, config.heal_tolerance);
        if mesh.vertex_count() == 0 || mesh.face_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }
        if !mesh.is_manifold() {
            return Err(KernelError::NonManifold);
        }
        let mut solid = Self {
            mesh,
            base_loop: Vec::new(),
            height: 0.0,
        };
        solid.refresh_metadata();
        Ok(solid)
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    /// Mutable mesh access; callers re-run [`HalfEdgeMesh::recompute_normals`] after moving vertices.
    pub fn mesh_mut(&mut self) -> &mut HalfEdgeMesh {
        &mut self.mesh
    }

    /// Replace the mesh without touching the base metadata.
    pub fn set_mesh(&mut self, mesh: HalfEdgeMesh) {
        self.mesh = mesh;
    }

    pub fn base_loop(&self) -> &[Vec3] {
        &self.base_loop
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_base_metadata(&mut self, base_loop: Vec<Vec3>, height: f64) {
        self.base_loop = base_loop;
        self.height = height;
    }

    /// Rebuild the base loop from the lowest ring of vertices.
    ///
    /// If that ring has fewer than three vertices every vertex is flattened
    /// onto the lowest plane instead. Ring points are ordered by angle around
    /// their centroid so the loop stays a simple polygon for convex rings.
    pub fn refresh_metadata(&mut self) {
        let positions = self.mesh.positions();
        if positions.is_empty() {
            self.base_loop.clear();
            self.height = 0.0;
            return;
        }
        let min_y = positions.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = positions.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let mut ring: Vec<Vec3> = positions
            .iter()
            .filter(|p| (p.y - min_y).abs() <= BASE_RING_TOLERANCE)
            .copied()
            .collect();
        if ring.len() < 3 {
            ring = positions.iter().map(|p| Vec3::new(p.x, min_y, p.z)).collect();
        }
        let center = centroid(&ring);
        ring.sort_by(|a, b| {
            let ta = (a.z - center.z).atan2(a.x - center.x);
            let tb = (b.z - center.z).atan2(b.x - center.x);
            ta.total_cmp(&tb)
        });
        ring.dedup_by(|a, b| (*a - *b).norm() <= BASE_RING_TOLERANCE);

        self.base_loop = ring;
        self.height = max_y - min_y;
    }

    /// Move every vertex and the base loop through `f`.
    pub fn apply_transform(&mut self, f: impl Fn(&Vec3) -> Vec3) {
        for vertex in self.mesh.vertices_mut() {
            vertex.position = f(&vertex.position);
        }
        for p in &mut self.base_loop {
            *p = f(p);
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
        self.height *= factors.y.abs();
    }
}
