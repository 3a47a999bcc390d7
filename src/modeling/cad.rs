// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CAD-style solid construction: revolve, sweep, mirror, shell, pattern, split

use super::push_pull::{PushAndPull, PushPullOptions};
use super::support::{build_skin_mesh, densify_path, retain_faces};
use super::surface::{Surface, SurfaceDrawOptions};
use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::polygon_normal;
use crate::geometry::transform::{reflect_across_plane, rotate_about_axis};
use crate::geometry::HalfEdgeMesh;
use crate::kernel::{GeometryKernel, ObjectId};
use crate::object::{Curve, Solid};
use crate::utils::math::{centroid, deg_to_rad, normalize_or, Vec3, EPSILON};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Angles this close to a full turn close the revolution instead of capping it.
const FULL_TURN_TOLERANCE_DEGREES: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevolveOptions {
    pub axis_point: Vec3,
    pub axis_direction: Vec3,
    pub angle_degrees: f64,
    pub segments: usize,
}

impl Default for RevolveOptions {
    fn default() -> Self {
        Self {
            axis_point: Vec3::zeros(),
            axis_direction: Vec3::y(),
            angle_degrees: 360.0,
            segments: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    pub samples: usize,
    pub cap_ends: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            samples: 32,
            cap_ends: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellOptions {
    pub thickness: f64,
    pub cap_holes: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            thickness: 0.05,
            cap_holes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    /// Number of instances, the first one sitting on the source
    pub count: usize,
    pub translation_step: Vec3,
    /// Rotation about +Y through the origin per instance
    pub rotation_step_degrees: f64,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            count: 2,
            translation_step: Vec3::zeros(),
            rotation_step_degrees: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    pub plane_point: Vec3,
    pub plane_normal: Vec3,
    /// Keep the faces on the side the normal points to
    pub keep_positive: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            plane_point: Vec3::zeros(),
            plane_normal: Vec3::y(),
            keep_positive: true,
        }
    }
}

/// Sweep a profile loop around an axis.
///
/// The profile is rewound if needed so that its normal follows the direction
/// of rotation, which keeps every face pointing outward.
pub fn revolve(profile: &Curve, options: &RevolveOptions) -> KernelResult<Solid> {
    let mut points = profile.boundary_loop().to_vec();
    if points.len() < 3 {
        return Err(KernelError::TooFewPoints {
            required: 3,
            found: points.len(),
        });
    }
    if options.axis_direction.norm() <= EPSILON {
        return Err(KernelError::DegenerateVector("revolve axis"));
    }
    let axis = options.axis_direction.normalize();
    let segments = options.segments.max(3);
    let angle = deg_to_rad(options.angle_degrees);
    let full_turn = options.angle_degrees.abs() >= 360.0 - FULL_TURN_TOLERANCE_DEGREES;

    let travel = axis.cross(&(centroid(&points) - options.axis_point)) * angle.signum();
    if travel.norm() <= EPSILON {
        return Err(KernelError::InvalidParameter("profile centroid lies on the revolve axis".into()));
    }
    if polygon_normal(&points).dot(&travel) < 0.0 {
        points.reverse();
    }

    let (ring_count, step) = if full_turn {
        (segments, std::f64::consts::TAU * angle.signum() / segments as f64)
    } else {
        (segments + 1, angle / segments as f64)
    };
    let rings: Vec<Vec<Vec3>> = (0..ring_count)
        .map(|r| {
            points
                .iter()
                .map(|p| rotate_about_axis(p, &options.axis_point, &axis, step * r as f64))
                .collect()
        })
        .collect();

    let mesh = build_skin_mesh(&rings, full_turn, !full_turn, !full_turn);
    if mesh.is_empty() {
        return Err(KernelError::EmptyMesh);
    }
    debug!(rings = rings.len(), full_turn, faces = mesh.face_count(), "revolved profile");
    Solid::create_from_mesh(mesh)
}

/// Translate a profile along `path` without rotating it.
pub fn sweep(profile: &Curve, path: &[Vec3], options: &SweepOptions) -> KernelResult<Solid> {
    if path.len() < 2 {
        return Err(KernelError::TooFewPoints {
            required: 2,
            found: path.len(),
        });
    }
    let mut points = profile.boundary_loop().to_vec();
    if points.len() < 3 {
        return Err(KernelError::TooFewPoints {
            required: 3,
            found: points.len(),
        });
    }

    let spacing = (1.0 / options.samples.max(1) as f64).max(0.05);
    let mut samples = densify_path(path, spacing);
    if samples.len() < 2 {
        samples = path.to_vec();
    }
    let travel = samples[samples.len() - 1] - samples[0];
    if polygon_normal(&points).dot(&travel) < 0.0 {
        points.reverse();
    }

    let center = centroid(&points);
    let rings: Vec<Vec<Vec3>> = samples
        .iter()
        .map(|origin| points.iter().map(|p| origin + (p - center)).collect())
        .collect();
    let mesh = build_skin_mesh(&rings, false, options.cap_ends, options.cap_ends);
    if mesh.is_empty() {
        return Err(KernelError::EmptyMesh);
    }
    debug!(rings = rings.len(), faces = mesh.face_count(), "swept profile");
    Solid::create_from_mesh(mesh)
}

/// Reflected copy of `solid`; face loops are reversed so normals stay outward.
pub fn mirror(solid: &Solid, plane_point: &Vec3, plane_normal: &Vec3) -> KernelResult<Solid> {
    if plane_normal.norm() <= EPSILON {
        return Err(KernelError::DegenerateVector("mirror plane normal"));
    }
    let mesh = solid.mesh();
    let positions: Vec<Vec3> = mesh
        .vertices()
        .iter()
        .map(|v| reflect_across_plane(&v.position, plane_point, plane_normal))
        .collect();
    let loops: Vec<Vec<usize>> = mesh
        .face_loops()
        .into_iter()
        .map(|mut l| {
            l.reverse();
            l
        })
        .collect();
    let (mirrored, dropped) = HalfEdgeMesh::from_polygons_lenient(&positions, &loops);
    if dropped > 0 {
        warn!(dropped, "mirror dropped faces");
    }
    Solid::create_from_mesh(mirrored)
}

/// Faces of `solid` on one side of a plane, judged by face centroid.
pub fn split_solid(solid: &Solid, options: &SplitOptions) -> KernelResult<Solid> {
    let normal = normalize_or(&options.plane_normal, Vec3::y());
    let mut kept = retain_faces(solid.mesh(), |_, face| {
        let side = (centroid(face) - options.plane_point).dot(&normal);
        (side >= 0.0) == options.keep_positive
    });
    kept.heal(EPSILON, EPSILON);
    kept.recompute_normals();
    if kept.face_count() == 0 {
        return Err(KernelError::EmptyMesh);
    }
    Solid::create_from_mesh(kept)
}

/// CAD operations that read and register kernel objects
pub struct CADDesigner<'k> {
    kernel: &'k mut GeometryKernel,
}

impl<'k> CADDesigner<'k> {
    pub fn new(kernel: &'k mut GeometryKernel) -> Self {
        Self { kernel }
    }

    pub fn revolve(&mut self, profile: ObjectId, options: &RevolveOptions) -> KernelResult<ObjectId> {
        let solid = revolve(self.kernel.curve(profile)?, options)?;
        Ok(self.kernel.add_object(solid))
    }

    pub fn sweep(&mut self, profile: ObjectId, path: &[Vec3], options: &SweepOptions) -> KernelResult<ObjectId> {
        let solid = sweep(self.kernel.curve(profile)?, path, options)?;
        Ok(self.kernel.add_object(solid))
    }

    pub fn mirror(&mut self, solid: ObjectId, plane_point: &Vec3, plane_normal: &Vec3) -> KernelResult<ObjectId> {
        let mirrored = mirror(self.kernel.solid(solid)?, plane_point, plane_normal)?;
        Ok(self.kernel.add_object(mirrored))
    }

    /// Hollow copy of `solid`; nothing stays registered if thickening fails.
    pub fn shell(&mut self, solid: ObjectId, options: &ShellOptions) -> KernelResult<ObjectId> {
        self.kernel.solid(solid)?;
        let copy = self.kernel.clone_object(solid)?;
        let thicken = PushPullOptions {
            distance: options.thickness,
            create_caps: options.cap_holes,
            generate_inner_shell: true,
            ..Default::default()
        };
        let result = self
            .kernel
            .solid_mut(copy)
            .and_then(|shell| PushAndPull::thicken(shell, &thicken));
        if let Err(err) = result {
            self.kernel.delete_object(copy);
            return Err(err);
        }
        Ok(copy)
    }

    /// `count` transformed copies of `solid`.
    pub fn pattern(&mut self, solid: ObjectId, options: &PatternOptions) -> KernelResult<Vec<ObjectId>> {
        self.kernel.solid(solid)?;
        let mut instances = Vec::with_capacity(options.count);
        for i in 0..options.count {
            let copy = self.kernel.clone_object(solid)?;
            let instance = self.kernel.solid_mut(copy)?;
            instance.translate(&(options.translation_step * i as f64));
            if options.rotation_step_degrees.abs() > EPSILON {
                let angle = deg_to_rad(options.rotation_step_degrees) * i as f64;
                instance.rotate(&Vec3::zeros(), &Vec3::y(), angle);
            }
            instances.push(copy);
        }
        debug!(count = instances.len(), "patterned solid");
        Ok(instances)
    }

    pub fn split(&mut self, solid: ObjectId, options: &SplitOptions) -> KernelResult<ObjectId> {
        let part = split_solid(self.kernel.solid(solid)?, options)?;
        Ok(self.kernel.add_object(part))
    }

    /// Trace `path` onto `solid` as a new curve, sampled at the kernel's `sampling_distance`.
    pub fn imprint(&mut self, solid: ObjectId, path: &[Vec3]) -> KernelResult<ObjectId> {
        let options = SurfaceDrawOptions {
            remesh: false,
            ..SurfaceDrawOptions::from_config(self.kernel.config())
        };
        Surface::new(self.kernel).draw_polyline_on_solid(solid, path, &options)
    }
}
