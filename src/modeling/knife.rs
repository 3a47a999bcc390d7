// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bezier knife: imprint, cut and groove solids along a projected path

use super::support::{project_onto_mesh, retain_faces, sample_bezier_path};
use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::{collapse_tiny_edges, distance_to_polyline, weld_sequential};
use crate::kernel::{GeometryKernel, ObjectId};
use crate::object::{Curve, Solid};
use crate::utils::math::{Vec3, EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Extra reach of the groove beyond the cut width
const GROOVE_SLACK: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnifeOptions {
    pub samples_per_segment: usize,
    /// Groove depth along the inverted vertex normal; ~0 disables the groove
    pub extrusion_height: f64,
    /// Delete faces whose centroid lies within `cut_width` of the path
    pub remove_interior: bool,
    pub cut_width: f64,
}

impl Default for KnifeOptions {
    fn default() -> Self {
        Self {
            samples_per_segment: 16,
            extrusion_height: 0.01,
            remove_interior: true,
            cut_width: 0.001,
        }
    }
}

/// Cut `solid` along the bezier path defined by `control`.
///
/// Returns the imprint curve traced on the surface. The solid is only
/// modified once the imprint and the new mesh have both been built; a solid
/// without triangles only yields the imprint of the unprojected path.
pub fn cut_solid(solid: &mut Solid, control: &[Vec3], options: &KnifeOptions) -> KernelResult<Curve> {
    if control.len() < 2 {
        return Err(KernelError::TooFewPoints {
            required: 2,
            found: control.len(),
        });
    }

    let samples = sample_bezier_path(control, options.samples_per_segment);
    let mesh = solid.mesh();
    let tolerance = (options.cut_width * 0.5).max(EPSILON);
    let mut path: Vec<Vec3> = samples
        .iter()
        .map(|p| project_onto_mesh(mesh, p).map_or(*p, |hit| hit.position))
        .collect();
    close_looped_path(&mut path, control, tolerance);
    let imprint_points = collapse_tiny_edges(&weld_sequential(&path, tolerance), tolerance);
    let imprint = Curve::create_from_points(&imprint_points, None)?;

    if mesh.triangles().is_empty() {
        debug!(imprint = imprint.len(), "knife path missed an empty solid");
        return Ok(imprint);
    }

    let mut working = if options.remove_interior {
        let kept = retain_faces(mesh, |_, face| {
            let center = face.iter().sum::<Vec3>() / face.len() as f64;
            distance_to_polyline(&center, &path) > options.cut_width
        });
        let removed = mesh.face_count() - kept.face_count();
        debug!(removed, "removed faces along knife path");
        kept
    } else {
        mesh.clone()
    };
    working.heal(EPSILON, EPSILON);

    if options.extrusion_height.abs() > EPSILON {
        let reach = options.cut_width + GROOVE_SLACK;
        let normals = working.vertex_normals();
        let mut grooved = 0usize;
        for (vertex, normal) in working.vertices_mut().iter_mut().zip(&normals) {
            if distance_to_polyline(&vertex.position, &path) <= reach {
                vertex.position -= normal * options.extrusion_height;
                grooved += 1;
            }
        }
        working.heal(EPSILON, EPSILON);
        working.recompute_normals();
        debug!(grooved, depth = options.extrusion_height, "grooved knife path");
    }

    if working.face_count() == 0 {
        return Err(KernelError::EmptyMesh);
    }
    solid.set_mesh(working);
    solid.refresh_metadata();
    debug!(samples = samples.len(), imprint = imprint.len(), "knife cut");
    Ok(imprint)
}

/// End a looped control chain exactly where it started so the distance
/// tests also cover the closing span.
fn close_looped_path(path: &mut Vec<Vec3>, control: &[Vec3], tolerance: f64) {
    let (Some(first), Some(last)) = (control.first(), control.last()) else {
        return;
    };
    if path.len() < 3 || (first - last).norm() > tolerance {
        return;
    }
    let start = path[0];
    if path.last() != Some(&start) {
        path.push(start);
    }
}

/// Knife facade; the imprint is registered as a new curve
pub struct BezierKnife<'k> {
    kernel: &'k mut GeometryKernel,
}

impl<'k> BezierKnife<'k> {
    pub fn new(kernel: &'k mut GeometryKernel) -> Self {
        Self { kernel }
    }

    pub fn cut(&mut self, solid: ObjectId, control: &[Vec3], options: &KnifeOptions) -> KernelResult<ObjectId> {
        let imprint = cut_solid(self.kernel.solid_mut(solid)?, control, options)?;
        Ok(self.kernel.add_object(imprint))
    }
}
