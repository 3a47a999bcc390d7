// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge mesh representation
//!
//! Vertices, half-edges and faces live in flat arrays and refer to each other
//! by index only, so a rebuild can reallocate storage freely. A directed-edge
//! index gives O(1) duplicate and opposite lookup during face insertion.

use super::mesh_utils::{grid_key, newell_vector, polygon_area, polygon_normal, triangle_normal, Edge, UnionFind};
use crate::error::TopologyError;
use crate::utils::math::Vec3;
use ahash::{AHashMap, AHashSet};
use tracing::debug;

/// Mesh vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// One outgoing half-edge, `None` while the vertex is isolated
    pub(crate) half_edge: Option<usize>,
}

impl Vertex {
    pub fn half_edge(&self) -> Option<usize> {
        self.half_edge
    }
}

/// Directed edge owned by exactly one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge {
    pub origin: usize,
    pub destination: usize,
    pub face: usize,
    /// Next half-edge around the same face
    pub next: usize,
    /// Reverse half-edge of the neighbouring face, `None` on an open boundary
    pub opposite: Option<usize>,
}

/// Polygonal face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub half_edge: usize,
    pub normal: Vec3,
}

/// Fan triangle derived from a face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub indices: [usize; 3],
    pub face: usize,
    pub normal: Vec3,
}

/// Half-edge mesh with a triangle fan cache and a directed-edge index
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    vertices: Vec<Vertex>,
    half_edges: Vec<HalfEdge>,
    faces: Vec<Face>,
    triangles: Vec<Triangle>,
    edge_map: AHashMap<(usize, usize), usize>,
}

impl HalfEdgeMesh {
    /// Create an empty half-edge mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from positions and face loops, failing on the first rejected face.
    pub fn from_polygons(positions: &[Vec3], loops: &[Vec<usize>]) -> Result<Self, TopologyError> {
        let mut mesh = Self::new();
        for p in positions {
            mesh.add_vertex(*p);
        }
        for face in loops {
            mesh.add_face(face)?;
        }
        Ok(mesh)
    }

    /// Build a mesh from positions and face loops, skipping faces that cannot be inserted.
    ///
    /// Returns the mesh and the number of dropped faces.
    pub fn from_polygons_lenient(positions: &[Vec3], loops: &[Vec<usize>]) -> (Self, usize) {
        let mut mesh = Self::new();
        for p in positions {
            mesh.add_vertex(*p);
        }
        let mut dropped = 0;
        for face in loops {
            if mesh.add_face(face).is_err() {
                dropped += 1;
            }
        }
        (mesh, dropped)
    }

    pub fn add_vertex(&mut self, position: Vec3) -> usize {
        self.vertices.push(Vertex {
            position,
            half_edge: None,
        });
        self.vertices.len() - 1
    }

    /// Insert a face for an ordered vertex loop.
    ///
    /// The whole loop is validated before anything is written, so a rejected
    /// loop leaves the mesh exactly as it was.
    pub fn add_face(&mut self, face_loop: &[usize]) -> Result<usize, TopologyError> {
        let n = face_loop.len();
        if n < 3 {
            return Err(TopologyError::LoopTooShort(n));
        }

        let mut pending: AHashSet<(usize, usize)> = AHashSet::with_capacity(n);
        for i in 0..n {
            let from = face_loop[i];
            let to = face_loop[(i + 1) % n];
            for v in [from, to] {
                if v >= self.vertices.len() {
                    return Err(TopologyError::VertexOutOfRange {
                        index: v,
                        count: self.vertices.len(),
                    });
                }
            }
            if from == to {
                return Err(TopologyError::DegenerateEdge(from));
            }
            if self.edge_map.contains_key(&(from, to)) || !pending.insert((from, to)) {
                return Err(TopologyError::DuplicateDirectedEdge { from, to });
            }
        }

        let face = self.faces.len();
        let base = self.half_edges.len();
        for i in 0..n {
            let from = face_loop[i];
            let to = face_loop[(i + 1) % n];
            let index = base + i;
            let opposite = self.edge_map.get(&(to, from)).copied();
            self.half_edges.push(HalfEdge {
                origin: from,
                destination: to,
                face,
                next: base + (i + 1) % n,
                opposite,
            });
            if let Some(opp) = opposite {
                self.half_edges[opp].opposite = Some(index);
            }
            self.edge_map.insert((from, to), index);
            if self.vertices[from].half_edge.is_none() {
                self.vertices[from].half_edge = Some(index);
            }
        }

        let positions: Vec<Vec3> = face_loop.iter().map(|&v| self.vertices[v].position).collect();
        let normal = polygon_normal(&positions);
        self.faces.push(Face {
            half_edge: base,
            normal,
        });
        for i in 1..n - 1 {
            let triangle = self.make_triangle([face_loop[0], face_loop[i], face_loop[i + 1]], face, normal);
            self.triangles.push(triangle);
        }
        Ok(face)
    }

    fn make_triangle(&self, indices: [usize; 3], face: usize, face_normal: Vec3) -> Triangle {
        let [a, b, c] = indices.map(|v| self.vertices[v].position);
        let n = triangle_normal(&a, &b, &c);
        Triangle {
            indices,
            face,
            normal: if n == Vec3::zeros() { face_normal } else { n },
        }
    }

    /// Every undirected edge has at most two half-edges, and pairs point at each other.
    pub fn is_manifold(&self) -> bool {
        let mut usage: AHashMap<Edge, Vec<usize>> = AHashMap::with_capacity(self.half_edges.len());
        for (index, he) in self.half_edges.iter().enumerate() {
            usage.entry(Edge::new(he.origin, he.destination)).or_default().push(index);
        }
        usage.values().all(|uses| match uses.as_slice() {
            [_] => true,
            [a, b] => self.half_edges[*a].opposite == Some(*b) && self.half_edges[*b].opposite == Some(*a),
            _ => false,
        })
    }

    /// Manifold, non-empty and without open boundary edges.
    pub fn is_closed(&self) -> bool {
        !self.faces.is_empty() && self.boundary_edge_count() == 0 && self.is_manifold()
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.half_edges.iter().filter(|he| he.opposite.is_none()).count()
    }

    /// Recompute face and triangle normals from the current vertex positions.
    pub fn recompute_normals(&mut self) {
        for face in 0..self.faces.len() {
            let positions: Vec<Vec3> = self.face_loop(face).iter().map(|&v| self.vertices[v].position).collect();
            self.faces[face].normal = polygon_normal(&positions);
        }
        for t in 0..self.triangles.len() {
            let tri = self.triangles[t];
            let face_normal = self.faces.get(tri.face).map(|f| f.normal).unwrap_or_else(Vec3::zeros);
            let updated = self.make_triangle(tri.indices, tri.face, face_normal);
            self.triangles[t] = updated;
        }
    }

    /// Vertex indices around a face, following `next` for at most one lap of the half-edge array.
    pub fn face_loop(&self, face: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let Some(start) = self.faces.get(face).map(|f| f.half_edge) else {
            return result;
        };
        let mut current = start;
        for _ in 0..self.half_edges.len() {
            let Some(he) = self.half_edges.get(current) else {
                break;
            };
            result.push(he.origin);
            current = he.next;
            if current == start {
                break;
            }
        }
        result
    }

    /// Loops of every face that closes properly and has at least three vertices.
    pub fn face_loops(&self) -> Vec<Vec<usize>> {
        (0..self.faces.len())
            .map(|f| self.face_loop(f))
            .filter(|l| l.len() >= 3)
            .collect()
    }

    pub fn face_positions(&self, face: usize) -> Vec<Vec3> {
        self.face_loop(face).iter().map(|&v| self.vertices[v].position).collect()
    }

    pub fn face_centroid(&self, face: usize) -> Vec3 {
        crate::utils::math::centroid(&self.face_positions(face))
    }

    pub fn face_area(&self, face: usize) -> f64 {
        polygon_area(&self.face_positions(face))
    }

    /// Half-edge running `from -> to`, if any face owns it.
    pub fn find_half_edge(&self, from: usize, to: usize) -> Option<usize> {
        self.edge_map.get(&(from, to)).copied()
    }

    /// Unique undirected edges in order of first appearance.
    pub fn undirected_edges(&self) -> Vec<Edge> {
        let mut seen = AHashSet::with_capacity(self.half_edges.len());
        self.half_edges
            .iter()
            .map(|he| Edge::new(he.origin, he.destination))
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// Sorted unique neighbours of every vertex.
    pub fn vertex_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.vertices.len()];
        for he in &self.half_edges {
            adjacency[he.origin].push(he.destination);
            adjacency[he.destination].push(he.origin);
        }
        for neighbours in &mut adjacency {
            neighbours.sort_unstable();
            neighbours.dedup();
        }
        adjacency
    }

    /// Area-weighted vertex normals; isolated vertices get a zero vector.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::zeros(); self.vertices.len()];
        for face in 0..self.faces.len() {
            let face_loop = self.face_loop(face);
            let positions: Vec<Vec3> = face_loop.iter().map(|&v| self.vertices[v].position).collect();
            let weighted = newell_vector(&positions);
            for v in face_loop {
                normals[v] += weighted;
            }
        }
        for n in &mut normals {
            let len = n.norm();
            if len > 1e-12 {
                *n /= len;
            }
        }
        normals
    }

    /// Merge nearby vertices, drop degenerate faces and rebuild all topology.
    ///
    /// Vertices within `weld_tolerance` of each other, or joined by an edge
    /// shorter than `collapse_tolerance`, end up as one vertex placed at the
    /// lowest-index member. Unreferenced vertices are removed; survivors keep
    /// their relative order.
    pub fn heal(&mut self, weld_tolerance: f64, collapse_tolerance: f64) {
        let count = self.vertices.len();
        if count == 0 {
            return;
        }

        let mut clusters = UnionFind::new(count);
        let mut merges = 0usize;
        if weld_tolerance > 0.0 {
            let cell = weld_tolerance;
            let tol_sq = weld_tolerance * weld_tolerance;
            let mut grid: AHashMap<(i64, i64, i64), Vec<usize>> = AHashMap::with_capacity(count);
            for (i, v) in self.vertices.iter().enumerate() {
                let key = grid_key(&v.position, cell);
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        for dz in -1..=1 {
                            let Some(bucket) = grid.get(&(key.0 + dx, key.1 + dy, key.2 + dz)) else {
                                continue;
                            };
                            for &j in bucket {
                                if (self.vertices[j].position - v.position).norm_squared() <= tol_sq
                                    && clusters.union(i, j)
                                {
                                    merges += 1;
                                }
                            }
                        }
                    }
                }
                grid.entry(key).or_default().push(i);
            }
        }
        if collapse_tolerance > 0.0 {
            let min_sq = collapse_tolerance * collapse_tolerance;
            for he in &self.half_edges {
                let length_sq = (self.vertices[he.origin].position - self.vertices[he.destination].position).norm_squared();
                if length_sq < min_sq && clusters.union(he.origin, he.destination) {
                    merges += 1;
                }
            }
        }

        let min_area = collapse_tolerance * collapse_tolerance * 0.5;
        let mut loops: Vec<Vec<usize>> = Vec::with_capacity(self.faces.len());
        let mut degenerate = 0usize;
        for face_loop in self.face_loops() {
            let mut mapped: Vec<usize> = Vec::with_capacity(face_loop.len());
            for v in face_loop {
                let root = clusters.find(v);
                if mapped.last() != Some(&root) {
                    mapped.push(root);
                }
            }
            while mapped.len() > 1 && mapped.first() == mapped.last() {
                mapped.pop();
            }
            let positions: Vec<Vec3> = mapped.iter().map(|&v| self.vertices[v].position).collect();
            if mapped.len() < 3 || (collapse_tolerance > 0.0 && polygon_area(&positions) < min_area) {
                degenerate += 1;
                continue;
            }
            loops.push(mapped);
        }

        let mut remap = vec![usize::MAX; count];
        let mut used = vec![false; count];
        for v in loops.iter().flatten() {
            used[*v] = true;
        }
        let mut positions = Vec::with_capacity(count);
        for (old, flag) in used.iter().enumerate() {
            if *flag {
                remap[old] = positions.len();
                positions.push(self.vertices[old].position);
            }
        }
        for face_loop in &mut loops {
            for v in face_loop.iter_mut() {
                *v = remap[*v];
            }
        }

        let (rebuilt, rejected) = Self::from_polygons_lenient(&positions, &loops);
        debug!(
            vertices_before = count,
            vertices_after = rebuilt.vertex_count(),
            merges,
            degenerate,
            rejected,
            "healed mesh"
        );
        *self = rebuilt;
    }

    /// Drop every element.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Mutable vertex access; call [`recompute_normals`](Self::recompute_normals) after moving positions.
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get face count
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Axis-aligned unit cube with outward winding.
    fn unit_cube() -> HalfEdgeMesh {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        let loops = vec![
            vec![0, 1, 2, 3],
            vec![4, 7, 6, 5],
            vec![0, 4, 5, 1],
            vec![1, 5, 6, 2],
            vec![2, 6, 7, 3],
            vec![3, 7, 4, 0],
        ];
        HalfEdgeMesh::from_polygons(&positions, &loops).unwrap()
    }

    #[test]
    fn test_single_quad_fan() {
        let mut mesh = HalfEdgeMesh::new();
        for p in [Vec3::zeros(), Vec3::x(), Vec3::new(1.0, 0.0, 1.0), Vec3::z()] {
            mesh.add_vertex(p);
        }
        let face = mesh.add_face(&[0, 3, 2, 1]).unwrap();
        assert_eq!(face, 0);
        assert_eq!(mesh.half_edge_count(), 4);
        assert_eq!(mesh.triangles().len(), 2);
        assert_relative_eq!(mesh.faces()[0].normal, Vec3::y(), epsilon = 1e-12);
        assert_eq!(mesh.face_loop(0), vec![0, 3, 2, 1]);
        assert_eq!(mesh.boundary_edge_count(), 4);
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_duplicate_directed_edge_rolls_back() {
        let mut mesh = HalfEdgeMesh::new();
        for p in [Vec3::zeros(), Vec3::x(), Vec3::z(), Vec3::new(1.0, 0.0, 1.0)] {
            mesh.add_vertex(p);
        }
        mesh.add_face(&[0, 1, 2]).unwrap();
        let before = mesh.clone();

        let err = mesh.add_face(&[1, 3, 2, 0, 1]).unwrap_err();
        assert!(matches!(err, TopologyError::DegenerateEdge(_) | TopologyError::DuplicateDirectedEdge { .. }));
        let err = mesh.add_face(&[0, 1, 3]).unwrap_err();
        assert_eq!(err, TopologyError::DuplicateDirectedEdge { from: 0, to: 1 });

        assert_eq!(mesh.half_edges(), before.half_edges());
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.triangles().len(), 1);
        assert_eq!(mesh.vertices()[3].half_edge(), None);
        assert!(mesh.find_half_edge(1, 3).is_none());
    }

    #[test]
    fn test_invalid_loops_rejected() {
        let mut mesh = HalfEdgeMesh::new();
        mesh.add_vertex(Vec3::zeros());
        mesh.add_vertex(Vec3::x());
        assert_eq!(mesh.add_face(&[0, 1]), Err(TopologyError::LoopTooShort(2)));
        assert_eq!(
            mesh.add_face(&[0, 1, 9]),
            Err(TopologyError::VertexOutOfRange { index: 9, count: 2 })
        );
    }

    #[test]
    fn test_opposites_pair_both_ways() {
        let mut mesh = HalfEdgeMesh::new();
        for p in [Vec3::zeros(), Vec3::x(), Vec3::z(), Vec3::new(1.0, 0.0, 1.0)] {
            mesh.add_vertex(p);
        }
        mesh.add_face(&[0, 2, 1]).unwrap();
        mesh.add_face(&[1, 2, 3]).unwrap();
        let a = mesh.find_half_edge(2, 1).unwrap();
        let b = mesh.find_half_edge(1, 2).unwrap();
        assert_eq!(mesh.half_edges()[a].opposite, Some(b));
        assert_eq!(mesh.half_edges()[b].opposite, Some(a));
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_cube_is_closed() {
        let cube = unit_cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 6);
        assert_eq!(cube.undirected_edges().len(), 12);
        assert!(cube.is_closed());
        for face in cube.faces() {
            assert_relative_eq!(face.normal.norm(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(cube.faces()[0].normal, -Vec3::y(), epsilon = 1e-12);
        assert_relative_eq!(cube.faces()[1].normal, Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_recompute_normals_after_move() {
        let mut cube = unit_cube();
        for v in cube.vertices_mut() {
            v.position.x *= -1.0;
        }
        cube.recompute_normals();
        assert_relative_eq!(cube.faces()[1].normal, -Vec3::y(), epsilon = 1e-12);
        for tri in cube.triangles() {
            let face_normal = cube.faces()[tri.face].normal;
            assert!(tri.normal.dot(&face_normal) > 0.99);
        }
    }

    #[test]
    fn test_heal_merges_split_seam() {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0 + 1e-7, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0 - 1e-7),
        ];
        let loops = vec![vec![0, 3, 2, 1], vec![4, 7, 6, 5]];
        let mut mesh = HalfEdgeMesh::from_polygons(&positions, &loops).unwrap();
        assert_eq!(mesh.boundary_edge_count(), 8);

        mesh.heal(1e-5, 1e-5);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.boundary_edge_count(), 6);
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_heal_drops_collapsed_faces_and_orphans() {
        let mut mesh = unit_cube();
        let stray = mesh.add_vertex(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(stray, 8);
        mesh.heal(1e-5, 1e-5);
        assert_eq!(mesh.vertex_count(), 8);
        assert!(mesh.is_closed());

        let mut flat = HalfEdgeMesh::new();
        for p in [Vec3::zeros(), Vec3::x() * 1e-7, Vec3::z() * 1e-7] {
            flat.add_vertex(p);
        }
        flat.add_face(&[0, 1, 2]).unwrap();
        flat.heal(0.0, 1e-5);
        assert!(flat.is_empty());
        assert_eq!(flat.face_count(), 0);
    }

    #[test]
    fn test_heal_is_idempotent_on_clean_mesh() {
        let mut cube = unit_cube();
        let before = cube.positions();
        cube.heal(1e-5, 1e-5);
        assert_eq!(cube.positions(), before);
        assert_eq!(cube.face_count(), 6);
        assert!(cube.is_closed());
    }

    #[test]
    fn test_vertex_normals_point_outward() {
        let cube = unit_cube();
        let center = Vec3::new(0.5, 0.5, 0.5);
        for (v, n) in cube.vertices().iter().zip(cube.vertex_normals()) {
            assert!((v.position - center).dot(&n) > 0.0);
        }
        let adjacency = cube.vertex_adjacency();
        assert!(adjacency.iter().all(|n| n.len() == 3));
    }
}
