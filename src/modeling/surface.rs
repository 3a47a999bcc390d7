// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polylines drawn onto solid surfaces

use super::support::{densify_path, project_onto_mesh};
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::{collapse_tiny_edges, weld_sequential};
use crate::geometry::HalfEdgeMesh;
use crate::kernel::{GeometryKernel, ObjectId};
use crate::object::{Curve, Solid};
use crate::utils::math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceDrawOptions {
    pub sampling_distance: f64,
    /// Lift along the surface normal after projection
    pub projection_offset: f64,
    /// Weld and collapse samples closer than half the sampling distance
    pub remesh: bool,
}

impl Default for SurfaceDrawOptions {
    fn default() -> Self {
        Self::from_config(&KernelConfig::default())
    }
}

impl SurfaceDrawOptions {
    /// Defaults sampled at the kernel's `sampling_distance`.
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            sampling_distance: config.sampling_distance,
            projection_offset: 0.0,
            remesh: true,
        }
    }
}

/// Densify `path` and snap every sample to the closest point on `mesh`.
///
/// A mesh without triangles leaves the samples where they are.
pub fn project_path(mesh: &HalfEdgeMesh, path: &[Vec3], options: &SurfaceDrawOptions) -> Vec<Vec3> {
    let dense = densify_path(path, options.sampling_distance);
    if mesh.triangles().is_empty() {
        warn!(samples = dense.len(), "mesh has no triangles, path left unprojected");
        return dense;
    }
    let mut projected: Vec<Vec3> = dense
        .iter()
        .map(|p| match project_onto_mesh(mesh, p) {
            Some(hit) => hit.position + hit.normal * options.projection_offset,
            None => *p,
        })
        .collect();
    if options.remesh {
        let tolerance = options.sampling_distance.max(1e-3) * 0.5;
        projected = collapse_tiny_edges(&weld_sequential(&projected, tolerance), tolerance);
    }
    projected
}

/// Project `path` onto `solid` and close it into a curve.
pub fn draw_polyline_on_solid(solid: &Solid, path: &[Vec3], options: &SurfaceDrawOptions) -> KernelResult<Curve> {
    if path.len() < 2 {
        return Err(KernelError::TooFewPoints {
            required: 2,
            found: path.len(),
        });
    }
    if solid.mesh().vertex_count() == 0 {
        return Err(KernelError::EmptyMesh);
    }
    let projected = project_path(solid.mesh(), path, options);
    debug!(input = path.len(), projected = projected.len(), "drew polyline on solid");
    Curve::create_from_points(&projected, None)
}

/// Surface drawing facade registering curves in a kernel
pub struct Surface<'k> {
    kernel: &'k mut GeometryKernel,
}

impl<'k> Surface<'k> {
    pub fn new(kernel: &'k mut GeometryKernel) -> Self {
        Self { kernel }
    }

    pub fn draw_polyline_on_solid(
        &mut self,
        solid: ObjectId,
        path: &[Vec3],
        options: &SurfaceDrawOptions,
    ) -> KernelResult<ObjectId> {
        let curve = draw_polyline_on_solid(self.kernel.solid(solid)?, path, options)?;
        Ok(self.kernel.add_object(curve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn slab() -> Solid {
        Primitive::cube(2.0, 2.0, 1.0).to_solid(&Vec3::zeros()).unwrap()
    }

    #[test]
    fn test_samples_land_on_top_with_offset() {
        let path = [Vec3::new(-0.4, 1.0, -0.4), Vec3::new(0.4, 1.0, -0.4), Vec3::new(0.0, 1.0, 0.4)];
        let options = SurfaceDrawOptions {
            projection_offset: 0.01,
            ..Default::default()
        };
        let curve = draw_polyline_on_solid(&slab(), &path, &options).unwrap();
        assert!(curve.len() > 3);
        for p in curve.boundary_loop() {
            assert_relative_eq!(p.y, 0.51, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_remesh_thins_samples() {
        let path = [Vec3::new(-0.4, 1.0, -0.4), Vec3::new(0.4, 1.0, -0.4), Vec3::new(0.0, 1.0, 0.4)];
        let fine = SurfaceDrawOptions {
            sampling_distance: 0.01,
            remesh: false,
            ..Default::default()
        };
        let dense = project_path(slab().mesh(), &path, &fine);
        let thinned = project_path(
            slab().mesh(),
            &path,
            &SurfaceDrawOptions {
                remesh: true,
                ..fine.clone()
            },
        );
        assert!(thinned.len() <= dense.len());
    }

    #[test]
    fn test_triangle_less_mesh_falls_back() {
        let path = [Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)];
        let projected = project_path(&HalfEdgeMesh::new(), &path, &SurfaceDrawOptions::default());
        assert_eq!(projected.first(), Some(&path[0]));
        assert_eq!(projected.last(), Some(&path[1]));
    }

    #[test]
    fn test_short_path_rejected() {
        let result = draw_polyline_on_solid(&slab(), &[Vec3::zeros()], &SurfaceDrawOptions::default());
        assert!(matches!(result, Err(KernelError::TooFewPoints { required: 2, .. })));
    }

    #[test]
    fn test_facade_registers_curve() {
        let mut kernel = GeometryKernel::new();
        let solid = kernel.add_object(slab());
        let path = [Vec3::new(-0.5, 2.0, -0.5), Vec3::new(0.5, 2.0, -0.5), Vec3::new(0.5, 2.0, 0.5)];
        let id = Surface::new(&mut kernel)
            .draw_polyline_on_solid(solid, &path, &SurfaceDrawOptions::default())
            .unwrap();
        assert!(kernel.curve(id).is_ok());
    }
}
