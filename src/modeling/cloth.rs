// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Position-based cloth relaxation

use crate::error::KernelResult;
use crate::geometry::BoundingBox;
use crate::object::Solid;
use crate::utils::math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MIN_TIMESTEP: f64 = 1e-4;
/// Height above a collider top that colliding vertices are lifted to
const COLLISION_LIFT: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothOptions {
    /// Share of its own position a vertex keeps in each relaxation pass
    pub stiffness: f64,
    pub damping: f64,
    pub solver_iterations: usize,
    pub timestep: f64,
    pub gravity: Vec3,
    pub pinned_vertices: Vec<usize>,
    /// Per-vertex gravity scale; missing entries count as 1
    pub weight_map: Vec<f64>,
    pub colliders: Vec<BoundingBox>,
}

impl Default for ClothOptions {
    fn default() -> Self {
        Self {
            stiffness: 0.9,
            damping: 0.02,
            solver_iterations: 5,
            timestep: 1.0 / 60.0,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            pinned_vertices: Vec::new(),
            weight_map: Vec::new(),
            colliders: Vec::new(),
        }
    }
}

impl ClothOptions {
    /// Collide against the bounds of `solid`.
    pub fn add_collider(&mut self, solid: &Solid) {
        if solid.mesh().vertex_count() > 0 {
            self.colliders.push(BoundingBox::from_mesh(solid.mesh()));
        }
    }
}

pub struct ClothEngine;

impl ClothEngine {
    /// Advance the cloth `frames` steps; an empty mesh is left as it is.
    pub fn simulate(cloth: &mut Solid, options: &ClothOptions, frames: usize) -> KernelResult<()> {
        if cloth.mesh().vertex_count() == 0 || frames == 0 {
            return Ok(());
        }

        let mesh = cloth.mesh_mut();
        let count = mesh.vertex_count();
        let dt = options.timestep.max(MIN_TIMESTEP);
        let adjacency = mesh.vertex_adjacency();
        let rest = mesh.positions();

        let mut pinned = vec![false; count];
        for &index in &options.pinned_vertices {
            if let Some(flag) = pinned.get_mut(index) {
                *flag = true;
            }
        }
        let weights: Vec<f64> = (0..count)
            .map(|i| options.weight_map.get(i).map_or(1.0, |w| w.max(0.0)))
            .collect();
        let mut velocities = vec![Vec3::zeros(); count];
        let mut collisions = 0usize;

        for _ in 0..frames {
            let vertices = mesh.vertices_mut();
            for i in 0..count {
                if pinned[i] {
                    vertices[i].position = rest[i];
                    velocities[i] = Vec3::zeros();
                    continue;
                }
                velocities[i] += options.gravity * dt * weights[i];
                velocities[i] *= 1.0 - options.damping;
                vertices[i].position += velocities[i] * dt;
            }

            for i in (0..count).filter(|&i| !pinned[i]) {
                for bounds in &options.colliders {
                    if bounds.contains(&vertices[i].position) {
                        vertices[i].position.y = bounds.max.y + COLLISION_LIFT;
                        velocities[i].y = velocities[i].y.max(0.0);
                        collisions += 1;
                    }
                }
            }

            for _ in 0..options.solver_iterations {
                for i in 0..count {
                    let neighbours = &adjacency[i];
                    if pinned[i] || neighbours.is_empty() {
                        continue;
                    }
                    let center = neighbours.iter().map(|&n| vertices[n].position).sum::<Vec3>() / neighbours.len() as f64;
                    vertices[i].position = vertices[i].position * options.stiffness + center * (1.0 - options.stiffness);
                }
            }
        }

        mesh.recompute_normals();
        cloth.refresh_metadata();
        debug!(frames, vertices = count, collisions, "simulated cloth");
        Ok(())
    }
}
