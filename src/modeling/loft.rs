// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Loft between two profile curves

use super::support::{align_loop_order, build_skin_mesh, laplacian_smooth, resample_loop, resample_path};
use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::polygon_normal;
use crate::geometry::transform::rotate_about_axis;
use crate::kernel::{GeometryKernel, ObjectId};
use crate::object::{Curve, Solid};
use crate::utils::math::{centroid, deg_to_rad, lerp_vec, normalize_or, Vec3, EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SMOOTHING_ALPHA: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoftOptions {
    /// Cross-sections including both ends
    pub sections: usize,
    /// Join the last section back to the first instead of capping
    pub close_rails: bool,
    pub smooth_normals: bool,
    pub twist_degrees: f64,
    pub smoothing_passes: usize,
    /// Search every rotation and winding of the end profile for the best vertex pairing
    pub symmetric_pairing: bool,
    /// Centroid path; straight interpolation when empty
    pub rail_a: Vec<Vec3>,
    /// Orientation rail controlling the roll of each section about the path
    pub rail_b: Vec<Vec3>,
}

impl Default for LoftOptions {
    fn default() -> Self {
        Self {
            sections: 8,
            close_rails: false,
            smooth_normals: true,
            twist_degrees: 0.0,
            smoothing_passes: 1,
            symmetric_pairing: false,
            rail_a: Vec::new(),
            rail_b: Vec::new(),
        }
    }
}

/// Interpolated cross-sections between two loops, all with the same point count.
pub fn loft_sections(start: &[Vec3], end: &[Vec3], options: &LoftOptions) -> KernelResult<Vec<Vec<Vec3>>> {
    for profile in [start, end] {
        if profile.len() < 3 {
            return Err(KernelError::TooFewPoints {
                required: 3,
                found: profile.len(),
            });
        }
    }

    let section_count = options.sections.max(2);
    let vertex_count = start.len().max(end.len()).max(3);
    let mut base = resample_loop(start, vertex_count);
    let mut top = resample_loop(end, vertex_count);
    if base.len() != top.len() {
        return Err(KernelError::InvalidParameter(format!(
            "profiles resampled to {} and {} points",
            base.len(),
            top.len()
        )));
    }
    if options.symmetric_pairing {
        align_loop_order(&base, &mut top);
    }

    let base_centroid = centroid(&base);
    let top_centroid = centroid(&top);
    let mut path = if options.rail_a.len() >= 2 {
        resample_path(&options.rail_a, section_count)
    } else {
        Vec::new()
    };
    if path.len() != section_count {
        path = (0..section_count)
            .map(|s| lerp_vec(&base_centroid, &top_centroid, s as f64 / (section_count - 1) as f64))
            .collect();
    }
    let orientation = if options.rail_b.len() >= 2 {
        resample_path(&options.rail_b, section_count)
    } else {
        Vec::new()
    };

    let mut base_normal = normalize_or(&polygon_normal(&base), Vec3::y());
    let travel = path[section_count - 1] - path[0];
    if travel.norm() > EPSILON && base_normal.dot(&travel) < 0.0 {
        // Caps face outward only when the base winds against the travel direction.
        base.reverse();
        top.reverse();
        base_normal = -base_normal;
    }

    let mut top_normal = polygon_normal(&top);
    if top_normal.norm_squared() <= EPSILON {
        top_normal = base_normal;
    }
    if top_normal.dot(&base_normal) < 0.0 {
        top.reverse();
        top_normal = -top_normal;
    }
    let axis = top_normal.cross(&base_normal);
    if axis.norm() > EPSILON {
        let angle = top_normal.dot(&base_normal).clamp(-1.0, 1.0).acos();
        for p in &mut top {
            *p = rotate_about_axis(p, &top_centroid, &axis, angle);
        }
    }

    let tangent_at = |s: usize| -> Vec3 {
        let forward = if s + 1 < section_count {
            path[s + 1] - path[s]
        } else {
            Vec3::zeros()
        };
        let direction = if forward.norm_squared() <= EPSILON && s > 0 {
            path[s] - path[s - 1]
        } else {
            forward
        };
        normalize_or(&direction, base_normal)
    };
    let up_at = |s: usize, tangent: &Vec3| -> Option<Vec3> {
        let direction = orientation.get(s)? - path[s];
        let projected = direction - tangent * direction.dot(tangent);
        (projected.norm() > EPSILON).then(|| projected.normalize())
    };
    let reference_up = up_at(0, &tangent_at(0));

    let mut sections = Vec::with_capacity(section_count);
    for s in 0..section_count {
        let t = s as f64 / (section_count - 1) as f64;
        let origin = path[s];
        let tangent = tangent_at(s);

        let mut roll = deg_to_rad(options.twist_degrees) * t;
        if let (Some(reference), Some(up)) = (reference_up, up_at(s, &tangent)) {
            let reference = normalize_or(&(reference - tangent * reference.dot(&tangent)), up);
            roll += tangent.dot(&reference.cross(&up)).atan2(reference.dot(&up));
        }

        let centroid_blend = lerp_vec(&base_centroid, &top_centroid, t);
        let section: Vec<Vec3> = base
            .iter()
            .zip(&top)
            .map(|(b, p)| {
                let placed = lerp_vec(b, p, t) + (origin - centroid_blend);
                if roll.abs() > EPSILON {
                    rotate_about_axis(&placed, &origin, &tangent, roll)
                } else {
                    placed
                }
            })
            .collect();
        sections.push(section);
    }
    Ok(sections)
}

/// Skin two curves into a solid.
pub fn loft(start: &Curve, end: &Curve, options: &LoftOptions) -> KernelResult<Solid> {
    let sections = loft_sections(start.boundary_loop(), end.boundary_loop(), options)?;
    let caps = !options.close_rails;
    let mut mesh = build_skin_mesh(&sections, options.close_rails, caps, caps);
    if mesh.is_empty() {
        return Err(KernelError::EmptyMesh);
    }
    if options.smooth_normals {
        laplacian_smooth(&mut mesh, options.smoothing_passes, SMOOTHING_ALPHA);
    }
    debug!(
        sections = sections.len(),
        ring = sections[0].len(),
        faces = mesh.face_count(),
        "lofted profiles"
    );
    Solid::create_from_mesh(mesh)
}

/// Loft facade registering results in a kernel
pub struct CurveIt<'k> {
    kernel: &'k mut GeometryKernel,
}

impl<'k> CurveIt<'k> {
    pub fn new(kernel: &'k mut GeometryKernel) -> Self {
        Self { kernel }
    }

    /// Loft between two kernel curves and register the solid.
    pub fn loft(&mut self, start: ObjectId, end: ObjectId, options: &LoftOptions) -> KernelResult<ObjectId> {
        let solid = loft(self.kernel.curve(start)?, self.kernel.curve(end)?, options)?;
        Ok(self.kernel.add_object(solid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes::{circle, rectangle};
    use approx::assert_relative_eq;

    fn square_at(y: f64) -> Vec<Vec3> {
        let mut points = rectangle(&Vec3::new(0.0, y, 0.0), 1.0, 1.0);
        points.reverse();
        points
    }

    #[test]
    fn test_sections_match_profiles() {
        let options = LoftOptions {
            sections: 5,
            ..Default::default()
        };
        let sections = loft_sections(&square_at(0.0), &square_at(2.0), &options).unwrap();
        assert_eq!(sections.len(), 5);
        assert!(sections.iter().all(|s| s.len() == 4));
        for (a, b) in sections[0].iter().zip(&square_at(0.0)) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
        for (a, b) in sections[4].iter().zip(&square_at(2.0)) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
        assert_relative_eq!(centroid(&sections[2]).y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_twist_rotates_last_section() {
        let options = LoftOptions {
            sections: 2,
            twist_degrees: 90.0,
            ..Default::default()
        };
        let sections = loft_sections(&square_at(0.0), &square_at(1.0), &options).unwrap();
        let first = sections[0][0] - centroid(&sections[0]);
        let last = sections[1][0] - centroid(&sections[1]);
        assert_relative_eq!(first.dot(&last), 0.0, epsilon = 1e-9);
        assert_relative_eq!(first.norm(), last.norm(), epsilon = 1e-9);
    }

    #[test]
    fn test_rail_a_moves_centroids() {
        let options = LoftOptions {
            sections: 3,
            rail_a: vec![Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0)],
            ..Default::default()
        };
        let sections = loft_sections(&square_at(0.0), &square_at(2.0), &options).unwrap();
        assert_relative_eq!(centroid(&sections[1]), Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_mismatched_counts_are_resampled() {
        let top: Vec<Vec3> = circle(&Vec3::new(0.0, 1.0, 0.0), &Vec3::new(0.5, 1.0, 0.0), 12);
        let sections = loft_sections(&square_at(0.0), &top, &LoftOptions::default()).unwrap();
        assert!(sections.iter().all(|s| s.len() == 12));
        assert!(loft_sections(&square_at(0.0)[..2], &top, &LoftOptions::default()).is_err());
    }

    #[test]
    fn test_loft_solid_is_closed() {
        let start = Curve::create_from_points(&square_at(0.0), None).unwrap();
        let end = Curve::create_from_points(&square_at(1.0), None).unwrap();
        let solid = loft(&start, &end, &LoftOptions::default()).unwrap();
        assert!(solid.mesh().is_closed());
        assert_eq!(solid.mesh().vertex_count(), 8 * 4);
        // caps face outward
        let lowest = solid
            .mesh()
            .faces()
            .iter()
            .min_by(|a, b| a.normal.y.total_cmp(&b.normal.y))
            .unwrap();
        assert!(lowest.normal.y < -0.9);
    }

    #[test]
    fn test_curve_it_registers_solid() {
        let mut kernel = GeometryKernel::new();
        let a = kernel.add_curve(&square_at(0.0)).unwrap();
        let b = kernel.add_curve(&square_at(1.5)).unwrap();
        let before = kernel.len();
        let id = CurveIt::new(&mut kernel).loft(a, b, &LoftOptions::default()).unwrap();
        assert_eq!(kernel.len(), before + 1);
        assert!(kernel.solid(id).is_ok());

        assert!(CurveIt::new(&mut kernel).loft(a, id, &LoftOptions::default()).is_err());
        assert_eq!(kernel.len(), before + 1);
    }
}
