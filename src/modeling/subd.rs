// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Catmull-Clark subdivision

use crate::error::{KernelError, KernelResult};
use crate::geometry::{Edge, HalfEdgeMesh};
use crate::object::Solid;
use crate::utils::math::{centroid, deg_to_rad, Vec3, EPSILON};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionOptions {
    pub levels: usize,
    /// Keep edges sharper than `crease_angle_degrees` sharp
    pub preserve_creases: bool,
    pub crease_angle_degrees: f64,
    /// Hand back the mesh as it was before subdividing
    pub generate_cage: bool,
}

impl Default for SubdivisionOptions {
    fn default() -> Self {
        Self {
            levels: 1,
            preserve_creases: false,
            crease_angle_degrees: 30.0,
            generate_cage: false,
        }
    }
}

struct EdgeRecord {
    edge: Edge,
    faces: Vec<usize>,
    crease: bool,
}

pub struct SubD;

impl SubD {
    /// Subdivide `solid` `levels` times.
    ///
    /// Returns the control cage when `generate_cage` is set. On error the
    /// solid keeps its current mesh.
    pub fn subdivide(solid: &mut Solid, options: &SubdivisionOptions) -> KernelResult<Option<HalfEdgeMesh>> {
        if options.levels == 0 {
            return Err(KernelError::InvalidParameter("subdivision needs at least one level".into()));
        }
        let cage = options.generate_cage.then(|| solid.mesh().clone());
        let mut mesh = solid.mesh().clone();
        for level in 0..options.levels {
            mesh = subdivide_once(&mesh, options)?;
            debug!(
                level = level + 1,
                vertices = mesh.vertex_count(),
                faces = mesh.face_count(),
                "subdivided"
            );
        }
        solid.set_mesh(mesh);
        solid.refresh_metadata();
        Ok(cage)
    }
}

/// One Catmull-Clark pass.
///
/// New vertices are laid out as face points, then edge points in order of
/// first appearance, then the moved original vertices.
pub fn subdivide_once(mesh: &HalfEdgeMesh, options: &SubdivisionOptions) -> KernelResult<HalfEdgeMesh> {
    let loops = mesh.face_loops();
    check_regular(loops.len(), mesh.face_count())?;
    if loops.is_empty() {
        return Err(KernelError::EmptyMesh);
    }
    let positions = mesh.positions();
    let face_points: Vec<Vec3> = loops
        .iter()
        .map(|l| centroid(&l.iter().map(|&v| positions[v]).collect::<Vec<_>>()))
        .collect();

    let mut edge_index: AHashMap<Edge, usize> = AHashMap::with_capacity(mesh.half_edge_count());
    let mut edges: Vec<EdgeRecord> = Vec::with_capacity(mesh.half_edge_count() / 2 + 1);
    for (face, face_loop) in loops.iter().enumerate() {
        for i in 0..face_loop.len() {
            let edge = Edge::new(face_loop[i], face_loop[(i + 1) % face_loop.len()]);
            let index = *edge_index.entry(edge).or_insert_with(|| {
                edges.push(EdgeRecord {
                    edge,
                    faces: Vec::with_capacity(2),
                    crease: false,
                });
                edges.len() - 1
            });
            edges[index].faces.push(face);
        }
    }

    if options.preserve_creases {
        let threshold = deg_to_rad(options.crease_angle_degrees).cos();
        let face_normals: Vec<Vec3> = mesh.faces().iter().map(|f| f.normal).collect();
        for record in &mut edges {
            if let [a, b] = record.faces[..] {
                record.crease = face_normals[a].dot(&face_normals[b]) < threshold;
            }
        }
    }

    let edge_points: Vec<Vec3> = edges
        .iter()
        .map(|record| {
            let (p0, p1) = (positions[record.edge.v0], positions[record.edge.v1]);
            match record.faces[..] {
                [a, b] if !record.crease => (p0 + p1 + face_points[a] + face_points[b]) / 4.0,
                _ => (p0 + p1) * 0.5,
            }
        })
        .collect();

    let mut incident_faces: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
    for (face, face_loop) in loops.iter().enumerate() {
        for &v in face_loop {
            incident_faces[v].push(face);
        }
    }
    let mut incident_edges: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
    for (index, record) in edges.iter().enumerate() {
        incident_edges[record.edge.v0].push(index);
        incident_edges[record.edge.v1].push(index);
    }

    let vertex_points: Vec<Vec3> = positions
        .iter()
        .enumerate()
        .map(|(v, p)| {
            let faces = &incident_faces[v];
            let around = &incident_edges[v];
            if faces.is_empty() || around.iter().any(|&e| edges[e].faces.len() != 2) {
                return *p;
            }
            let creases: Vec<usize> = around.iter().copied().filter(|&e| edges[e].crease).collect();
            match creases.len() {
                0 | 1 => {}
                2 => {
                    let neighbours: Vec3 = creases
                        .iter()
                        .map(|&e| {
                            let edge = edges[e].edge;
                            positions[if edge.v0 == v { edge.v1 } else { edge.v0 }]
                        })
                        .sum();
                    return (p * 6.0 + neighbours) / 8.0;
                }
                _ => return *p,
            }
            let n = faces.len() as f64;
            let f = faces.iter().map(|&face| face_points[face]).sum::<Vec3>() / n;
            let r = around
                .iter()
                .map(|&e| (positions[edges[e].edge.v0] + positions[edges[e].edge.v1]) * 0.5)
                .sum::<Vec3>()
                / around.len() as f64;
            (f + r * 2.0 + p * (n - 3.0)) / n
        })
        .collect();

    let face_base = 0;
    let edge_base = face_points.len();
    let vertex_base = edge_base + edge_points.len();
    let mut new_positions = face_points;
    new_positions.extend(edge_points);
    new_positions.extend(vertex_points);

    let edge_of = |a: usize, b: usize| edge_index.get(&Edge::new(a, b)).map(|&e| edge_base + e);
    let mut quads: Vec<Vec<usize>> = Vec::with_capacity(mesh.half_edge_count());
    for (face, face_loop) in loops.iter().enumerate() {
        let n = face_loop.len();
        for i in 0..n {
            let (prev, current, next) = (face_loop[(i + n - 1) % n], face_loop[i], face_loop[(i + 1) % n]);
            let (Some(outgoing), Some(incoming)) = (edge_of(current, next), edge_of(prev, current)) else {
                continue;
            };
            quads.push(vec![vertex_base + current, outgoing, face_base + face, incoming]);
        }
    }

    let (mut refined, rejected) = HalfEdgeMesh::from_polygons_lenient(&new_positions, &quads);
    if rejected > 0 {
        debug!(rejected, "subdivision quads rejected");
    }
    refined.heal(EPSILON, EPSILON);
    check_regular(refined.face_loops().len(), refined.face_count())?;
    Ok(refined)
}

fn check_regular(loops: usize, faces: usize) -> KernelResult<()> {
    if loops != faces {
        return Err(KernelError::IrregularTopology { loops, faces });
    }
    Ok(())
}
