// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Soft-selection vertex editing

use crate::error::{KernelError, KernelResult};
use crate::geometry::transform::{rotate_about_axis, scale_from_pivot};
use crate::object::Solid;
use crate::utils::math::{centroid, deg_to_rad, normalize_or, Vec3, EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MIN_RADIUS: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftSelectionOptions {
    /// Reach of the selection around the seeds
    pub radius: f64,
    /// Exponent on the linear falloff; ~0 keeps it linear
    pub falloff: f64,
    pub translation: Vec3,
    pub rotation_axis: Vec3,
    pub rotation_degrees: f64,
    pub scaling: Vec3,
}

impl Default for SoftSelectionOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            falloff: 2.0,
            translation: Vec3::zeros(),
            rotation_axis: Vec3::y(),
            rotation_degrees: 0.0,
            scaling: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl SoftSelectionOptions {
    /// Influence of the edit on a vertex `distance` away from the nearest seed.
    pub fn weight(&self, distance: f64) -> f64 {
        let radius = self.radius.max(MIN_RADIUS);
        if distance > radius {
            return 0.0;
        }
        let t = (1.0 - distance / radius).max(0.0);
        let falloff = self.falloff.max(0.0);
        if falloff <= EPSILON {
            t
        } else {
            t.powf(falloff)
        }
    }
}

pub struct VertexTools;

impl VertexTools {
    /// Translate, rotate and scale the vertices around `seeds`, weighted by distance.
    ///
    /// Out-of-range seed indices are ignored. Rotation and scaling pivot on
    /// the centroid of the valid seeds.
    pub fn apply_soft_selection(solid: &mut Solid, seeds: &[usize], options: &SoftSelectionOptions) -> KernelResult<usize> {
        let radius = options.radius.max(MIN_RADIUS);
        let seed_positions: Vec<Vec3> = seeds
            .iter()
            .filter_map(|&i| solid.mesh().vertices().get(i).map(|v| v.position))
            .collect();
        if seed_positions.is_empty() {
            return Err(KernelError::NothingAffected(radius));
        }

        let pivot = centroid(&seed_positions);
        let axis = normalize_or(&options.rotation_axis, Vec3::y());
        let rotation = deg_to_rad(options.rotation_degrees);

        let mut affected = 0usize;
        for vertex in solid.mesh_mut().vertices_mut() {
            let distance = seed_positions
                .iter()
                .map(|s| (vertex.position - s).norm())
                .fold(f64::INFINITY, f64::min);
            if distance > radius {
                continue;
            }
            let w = options.weight(distance);
            let mut p = vertex.position + options.translation * w;
            if rotation.abs() > EPSILON {
                p = rotate_about_axis(&p, &pivot, &axis, rotation * w);
            }
            let factors = Vec3::repeat(1.0) + (options.scaling - Vec3::repeat(1.0)) * w;
            vertex.position = scale_from_pivot(&p, &pivot, &factors);
            affected += 1;
        }

        if affected == 0 {
            return Err(KernelError::NothingAffected(radius));
        }
        solid.mesh_mut().recompute_normals();
        solid.refresh_metadata();
        debug!(seeds = seed_positions.len(), affected, radius, "soft selection applied");
        Ok(affected)
    }
}
