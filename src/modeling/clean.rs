// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh and curve cleanup

use super::support::retain_faces;
use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::{collapse_tiny_edges, polygon_area, polygon_normal, weld_sequential};
use crate::geometry::HalfEdgeMesh;
use crate::object::{Curve, Solid};
use crate::utils::math::Vec3;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Two faces count as coplanar when their normals agree this closely.
const COPLANAR_DOT: f64 = 1.0 - 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    pub min_edge_length: f64,
    pub min_face_area: f64,
    pub remove_unused_vertices: bool,
    /// Dissolve edges between coplanar faces that form a single quad or larger polygon
    pub merge_coplanar_faces: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            min_edge_length: 1e-4,
            min_face_area: 1e-6,
            remove_unused_vertices: true,
            merge_coplanar_faces: false,
        }
    }
}

pub struct Clean;

impl Clean {
    /// Drop sliver faces, collapse short edges and optionally merge coplanar faces.
    pub fn apply_solid(solid: &mut Solid, options: &CleanOptions) -> KernelResult<()> {
        let mesh = solid.mesh();
        if mesh.vertex_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }
        let before = (mesh.vertex_count(), mesh.face_count());

        let mut cleaned = if options.remove_unused_vertices {
            retain_faces(mesh, |_, face| polygon_area(face) >= options.min_face_area)
        } else {
            let positions = mesh.positions();
            let loops: Vec<Vec<usize>> = mesh
                .face_loops()
                .into_iter()
                .filter(|l| {
                    let face: Vec<Vec3> = l.iter().map(|&v| positions[v]).collect();
                    polygon_area(&face) >= options.min_face_area
                })
                .collect();
            HalfEdgeMesh::from_polygons_lenient(&positions, &loops).0
        };
        if options.merge_coplanar_faces {
            cleaned = merge_coplanar(&cleaned);
        }
        cleaned.heal(options.min_edge_length, options.min_edge_length);
        cleaned.recompute_normals();

        if cleaned.vertex_count() == 0 || cleaned.face_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }
        debug!(
            vertices_before = before.0,
            faces_before = before.1,
            vertices = cleaned.vertex_count(),
            faces = cleaned.face_count(),
            "cleaned solid"
        );
        solid.set_mesh(cleaned);
        solid.refresh_metadata();
        Ok(())
    }

    /// Sequential weld plus short-edge collapse at `min_edge_length`.
    pub fn apply_curve(curve: &mut Curve, options: &CleanOptions) -> KernelResult<()> {
        if curve.len() < 3 {
            return Err(KernelError::TooFewPoints {
                required: 3,
                found: curve.len(),
            });
        }
        let points = collapse_tiny_edges(
            &weld_sequential(curve.boundary_loop(), options.min_edge_length),
            options.min_edge_length,
        );
        let hardness = curve.hardness_for(&points);
        curve.rebuild_from_points(&points, Some(&hardness))
    }
}

/// Greedily join pairs of coplanar neighbours across their shared edge.
///
/// Each face takes part in at most one merge per call, so the result stays
/// a simple polygon whenever the inputs were convex.
fn merge_coplanar(mesh: &HalfEdgeMesh) -> HalfEdgeMesh {
    let loops = mesh.face_loops();
    let positions = mesh.positions();
    let normals: Vec<Vec3> = loops
        .iter()
        .map(|l| polygon_normal(&l.iter().map(|&v| positions[v]).collect::<Vec<_>>()))
        .collect();

    let mut owner: AHashMap<(usize, usize), usize> = AHashMap::new();
    for (f, face_loop) in loops.iter().enumerate() {
        for i in 0..face_loop.len() {
            owner.insert((face_loop[i], face_loop[(i + 1) % face_loop.len()]), f);
        }
    }

    let mut merged = vec![false; loops.len()];
    let mut result: Vec<Vec<usize>> = Vec::with_capacity(loops.len());
    let mut joins = 0usize;
    for (f, face_loop) in loops.iter().enumerate() {
        if merged[f] {
            continue;
        }
        let n = face_loop.len();
        let partner = (0..n).find_map(|i| {
            let (a, b) = (face_loop[i], face_loop[(i + 1) % n]);
            let g = *owner.get(&(b, a))?;
            let shares_one_edge = loops[g].iter().filter(|v| face_loop.contains(v)).count() == 2;
            (g != f && !merged[g] && shares_one_edge && normals[f].dot(&normals[g]) >= COPLANAR_DOT).then_some((i, g))
        });
        let Some((i, g)) = partner else {
            merged[f] = true;
            result.push(face_loop.clone());
            continue;
        };

        // Walk f from the far end of the shared edge round to its start, then g between them.
        let a = face_loop[i];
        let other = &loops[g];
        let m = other.len();
        let Some(start) = other.iter().position(|&v| v == a) else {
            result.push(face_loop.clone());
            merged[f] = true;
            continue;
        };
        let mut joined: Vec<usize> = (1..=n).map(|k| face_loop[(i + k) % n]).collect();
        joined.extend((1..m - 1).map(|k| other[(start + k) % m]));
        merged[f] = true;
        merged[g] = true;
        joins += 1;
        result.push(joined);
    }
    debug!(joins, "merged coplanar faces");
    HalfEdgeMesh::from_polygons_lenient(&positions, &result).0
}
