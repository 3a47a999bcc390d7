// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Offset and shell thickening of solids

use crate::error::{KernelError, KernelResult};
use crate::geometry::{Edge, HalfEdgeMesh};
use crate::object::Solid;
use crate::utils::math::{Vec3, EPSILON};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushPullOptions {
    pub distance: f64,
    pub create_caps: bool,
    /// Area-weighted vertex normals; otherwise every adjacent face counts equally
    pub soften_normals: bool,
    /// Keep the original surface and add an offset copy
    pub generate_inner_shell: bool,
    pub max_thickness: f64,
}

impl Default for PushPullOptions {
    fn default() -> Self {
        Self {
            distance: 0.1,
            create_caps: true,
            soften_normals: true,
            generate_inner_shell: true,
            max_thickness: 10.0,
        }
    }
}

pub struct PushAndPull;

impl PushAndPull {
    /// Offset `solid` along its vertex normals, or turn it into a shell.
    pub fn thicken(solid: &mut Solid, options: &PushPullOptions) -> KernelResult<()> {
        let mesh = solid.mesh();
        if mesh.vertex_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }
        let limit = options.max_thickness.abs();
        let distance = options.distance.clamp(-limit, limit);
        if distance.abs() <= EPSILON {
            return Err(KernelError::InvalidParameter(format!("thickness {} is ~0", options.distance)));
        }

        let normals = if options.soften_normals {
            mesh.vertex_normals()
        } else {
            unweighted_vertex_normals(mesh)
        };
        if !options.generate_inner_shell {
            for (vertex, normal) in solid.mesh_mut().vertices_mut().iter_mut().zip(&normals) {
                vertex.position += normal * distance;
            }
            let mesh = solid.mesh_mut();
            if options.create_caps {
                mesh.heal(EPSILON, EPSILON);
            }
            mesh.recompute_normals();
            solid.refresh_metadata();
            debug!(distance, "offset solid");
            return Ok(());
        }

        let shell = build_shell(mesh, &normals, distance, options.create_caps);
        if shell.face_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }
        debug!(
            distance,
            vertices = shell.vertex_count(),
            faces = shell.face_count(),
            "thickened solid"
        );
        solid.set_mesh(shell);
        solid.refresh_metadata();
        Ok(())
    }
}

fn unweighted_vertex_normals(mesh: &HalfEdgeMesh) -> Vec<Vec3> {
    let mut normals = vec![Vec3::zeros(); mesh.vertex_count()];
    for (face, data) in mesh.faces().iter().enumerate() {
        for v in mesh.face_loop(face) {
            normals[v] += data.normal;
        }
    }
    for n in &mut normals {
        if n.norm() > EPSILON {
            n.normalize_mut();
        }
    }
    normals
}

/// Inner copy at the original surface, outer copy offset by `distance`.
///
/// Vertex `i` becomes `2i` (inner) and `2i + 1` (outer). Open boundary edges
/// are bridged by side quads.
fn build_shell(mesh: &HalfEdgeMesh, normals: &[Vec3], distance: f64, caps: bool) -> HalfEdgeMesh {
    let inner = |v: usize| 2 * v;
    let outer = |v: usize| 2 * v + 1;

    let mut positions = Vec::with_capacity(mesh.vertex_count() * 2);
    for (vertex, normal) in mesh.vertices().iter().zip(normals) {
        positions.push(vertex.position);
        positions.push(vertex.position + normal * distance);
    }

    let face_loops = mesh.face_loops();
    let mut loops: Vec<Vec<usize>> = Vec::with_capacity(face_loops.len() * 2);
    if caps {
        for face_loop in &face_loops {
            loops.push(face_loop.iter().rev().map(|&v| inner(v)).collect());
            loops.push(face_loop.iter().map(|&v| outer(v)).collect());
        }
    }

    let mut stitched = AHashSet::new();
    for face_loop in &face_loops {
        for i in 0..face_loop.len() {
            let (v0, v1) = (face_loop[i], face_loop[(i + 1) % face_loop.len()]);
            let open = mesh
                .find_half_edge(v0, v1)
                .map_or(false, |he| mesh.half_edges()[he].opposite.is_none());
            if open && stitched.insert(Edge::new(v0, v1)) {
                loops.push(vec![inner(v0), inner(v1), outer(v1), outer(v0)]);
            }
        }
    }

    let (mut shell, dropped) = HalfEdgeMesh::from_polygons_lenient(&positions, &loops);
    if dropped > 0 {
        debug!(dropped, "shell faces rejected");
    }
    shell.heal(EPSILON, EPSILON);
    shell
}
