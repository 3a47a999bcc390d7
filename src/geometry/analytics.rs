// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh analytics and statistics

use super::{BoundingBox, HalfEdgeMesh};
use crate::utils::math::{centroid, Vec3};
use serde::{Deserialize, Serialize};

/// Mesh statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshStats {
    /// Enclosed volume; only meaningful when the mesh is watertight
    pub volume: f64,
    pub surface_area: f64,
    pub bbox: BoundingBox,
    /// Average vertex position
    pub centroid: Vec3,
    pub vertex_count: usize,
    pub face_count: usize,
    pub triangle_count: usize,
    pub boundary_edges: usize,
    /// Every half-edge has an opposite
    pub is_watertight: bool,
}

impl MeshStats {
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: BoundingBox::new(Vec3::zeros(), Vec3::zeros()),
            centroid: Vec3::zeros(),
            vertex_count: 0,
            face_count: 0,
            triangle_count: 0,
            boundary_edges: 0,
            is_watertight: false,
        }
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let size = self.bbox.size();
        format!(
            "{} vertices, {} faces, {} triangles, area {:.4}, volume {:.4}, size {:.3} x {:.3} x {:.3}{}",
            self.vertex_count,
            self.face_count,
            self.triangle_count,
            self.surface_area,
            self.volume,
            size.x,
            size.y,
            size.z,
            if self.is_watertight { ", watertight" } else { "" }
        )
    }
}

/// Analyze a mesh and compute statistics
pub fn analyze(mesh: &HalfEdgeMesh) -> MeshStats {
    if mesh.vertex_count() == 0 || mesh.face_count() == 0 {
        return MeshStats::empty();
    }

    let positions = mesh.positions();
    let boundary_edges = mesh.boundary_edge_count();

    MeshStats {
        volume: signed_volume(mesh).abs(),
        surface_area: surface_area(mesh),
        bbox: BoundingBox::from_points(&positions),
        centroid: centroid(&positions),
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        triangle_count: mesh.triangles().len(),
        boundary_edges,
        is_watertight: boundary_edges == 0 && mesh.is_manifold(),
    }
}

/// Sum of signed tetrahedra against the origin; positive for outward winding.
pub fn signed_volume(mesh: &HalfEdgeMesh) -> f64 {
    let vertices = mesh.vertices();
    mesh.triangles()
        .iter()
        .map(|t| {
            let [a, b, c] = t.indices.map(|i| vertices[i].position);
            a.dot(&b.cross(&c)) / 6.0
        })
        .sum()
}

fn surface_area(mesh: &HalfEdgeMesh) -> f64 {
    let vertices = mesh.vertices();
    mesh.triangles()
        .iter()
        .map(|t| {
            let [a, b, c] = t.indices.map(|i| vertices[i].position);
            (b - a).cross(&(c - a)).norm() * 0.5
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_analyze_box() {
        let solid = Primitive::cube(10.0, 10.0, 10.0).to_solid(&Vec3::zeros()).unwrap();
        let stats = analyze(solid.mesh());

        assert!((stats.volume - 1000.0).abs() < 1e-6);
        assert!((stats.surface_area - 600.0).abs() < 1e-6);
        assert_eq!(stats.vertex_count, 8);
        assert_eq!(stats.face_count, 6);
        assert_eq!(stats.triangle_count, 12);
        assert!(stats.is_watertight);
        assert!(stats.centroid.norm() < 1e-9);
        assert!(signed_volume(solid.mesh()) > 0.0);
    }

    #[test]
    fn test_analyze_sphere() {
        let solid = Primitive::sphere(5.0, 32, 16).to_solid(&Vec3::zeros()).unwrap();
        let stats = analyze(solid.mesh());

        let expected_volume = 4.0 / 3.0 * std::f64::consts::PI * 5.0_f64.powi(3);
        let expected_area = 4.0 * std::f64::consts::PI * 5.0_f64.powi(2);
        assert!(
            (stats.volume - expected_volume).abs() < expected_volume * 0.05,
            "Volume {} not close to expected {}",
            stats.volume,
            expected_volume
        );
        assert!(
            (stats.surface_area - expected_area).abs() < expected_area * 0.05,
            "Surface area {} not close to expected {}",
            stats.surface_area,
            expected_area
        );
        assert!(stats.is_watertight);
    }

    #[test]
    fn test_open_mesh_not_watertight() {
        let solid = crate::object::Solid::create_from_profile(
            &super::super::shapes::rectangle(&Vec3::zeros(), 1.0, 1.0),
            &Vec3::y(),
            false,
            true,
        )
        .unwrap();
        let stats = analyze(solid.mesh());
        assert_eq!(stats.boundary_edges, 4);
        assert!(!stats.is_watertight);
        assert!(analyze(&HalfEdgeMesh::new()).summary().starts_with("0 vertices"));
    }
}
