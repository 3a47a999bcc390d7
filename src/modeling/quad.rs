// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle and n-gon to quad retopology

use crate::error::{KernelError, KernelResult};
use crate::geometry::mesh_utils::triangle_normal;
use crate::geometry::{Edge, HalfEdgeMesh};
use crate::object::Solid;
use crate::utils::math::{Vec3, EPSILON};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadConversionOptions {
    /// Weld and collapse tolerance for the heal passes
    pub merge_threshold: f64,
    /// Fail unless every resulting face is a quad
    pub validate_topology: bool,
    /// Close open boundary loops with a face before converting
    pub fill_holes: bool,
}

impl Default for QuadConversionOptions {
    fn default() -> Self {
        Self {
            merge_threshold: 1e-4,
            validate_topology: true,
            fill_holes: true,
        }
    }
}

pub struct QuadTools;

impl QuadTools {
    /// Rebuild the faces of `solid` as quads.
    ///
    /// With validation on, the solid is left untouched when any non-quad
    /// face survives.
    pub fn retopologize_to_quads(solid: &mut Solid, options: &QuadConversionOptions) -> KernelResult<()> {
        let mut mesh = solid.mesh().clone();
        mesh.heal(options.merge_threshold, options.merge_threshold);
        if mesh.face_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }

        let mut loops = mesh.face_loops();
        if options.fill_holes {
            let holes = boundary_holes(&mesh);
            if !holes.is_empty() {
                debug!(holes = holes.len(), "filling boundary holes");
            }
            loops.extend(holes);
        }

        let mut quads: Vec<Vec<usize>> = Vec::with_capacity(loops.len());
        let mut triangles: Vec<[usize; 3]> = Vec::new();
        for face_loop in loops {
            match face_loop.len() {
                3 => triangles.push([face_loop[0], face_loop[1], face_loop[2]]),
                4 => quads.push(face_loop),
                n => {
                    let (split, leftover) = fan_split(&face_loop);
                    quads.extend(split);
                    if let Some(tri) = leftover {
                        triangles.push(tri);
                    }
                    debug!(sides = n, "fan-split n-gon");
                }
            }
        }

        let positions = mesh.positions();
        let (paired, unpaired) = pair_triangles(&positions, &triangles);
        let merged = paired.len();
        quads.extend(paired);
        quads.extend(unpaired.into_iter().map(|t| t.to_vec()));

        let (mut rebuilt, rejected) = HalfEdgeMesh::from_polygons_lenient(&positions, &quads);
        rebuilt.heal(options.merge_threshold, options.merge_threshold);

        let non_quads = rebuilt.face_loops().iter().filter(|l| l.len() != 4).count();
        debug!(
            faces = rebuilt.face_count(),
            merged,
            non_quads,
            rejected,
            "retopologized to quads"
        );
        if options.validate_topology && non_quads > 0 {
            return Err(KernelError::NonQuadFaces(non_quads));
        }
        if non_quads > 0 {
            warn!(non_quads, "retopology kept non-quad faces");
        }
        if rebuilt.face_count() == 0 {
            return Err(KernelError::EmptyMesh);
        }
        solid.set_mesh(rebuilt);
        solid.refresh_metadata();
        Ok(())
    }
}

/// Quads `(0, 2k+1, 2k+2, 2k+3)` across the loop, plus the closing triangle of an odd loop.
fn fan_split(face_loop: &[usize]) -> (Vec<Vec<usize>>, Option<[usize; 3]>) {
    let n = face_loop.len();
    let mut quads = Vec::with_capacity(n / 2);
    let mut k = 0;
    while 2 * k + 3 < n {
        quads.push(vec![face_loop[0], face_loop[2 * k + 1], face_loop[2 * k + 2], face_loop[2 * k + 3]]);
        k += 1;
    }
    let leftover = (n % 2 == 1).then(|| [face_loop[0], face_loop[n - 2], face_loop[n - 1]]);
    (quads, leftover)
}

/// Merge each triangle with an unused neighbour across a shared edge.
///
/// Among the candidates the most coplanar neighbour wins, ties going to the
/// first edge. For triangles `(v0, v1, f)` and `(v1, v0, g)` the quad is
/// `[f, v0, g, v1]`.
fn pair_triangles(positions: &[Vec3], triangles: &[[usize; 3]]) -> (Vec<Vec<usize>>, Vec<[usize; 3]>) {
    let mut by_edge: AHashMap<Edge, Vec<usize>> = AHashMap::with_capacity(triangles.len() * 3);
    for (t, tri) in triangles.iter().enumerate() {
        for i in 0..3 {
            by_edge.entry(Edge::new(tri[i], tri[(i + 1) % 3])).or_default().push(t);
        }
    }
    let normals: Vec<Vec3> = triangles
        .iter()
        .map(|t| triangle_normal(&positions[t[0]], &positions[t[1]], &positions[t[2]]))
        .collect();

    let mut used = vec![false; triangles.len()];
    let mut quads = Vec::new();
    for (t, tri) in triangles.iter().enumerate() {
        if used[t] {
            continue;
        }
        let mut best: Option<(f64, usize, Vec<usize>)> = None;
        for i in 0..3 {
            let (v0, v1, f) = (tri[i], tri[(i + 1) % 3], tri[(i + 2) % 3]);
            let Some(neighbours) = by_edge.get(&Edge::new(v0, v1)) else {
                continue;
            };
            for &u in neighbours {
                if u == t || used[u] {
                    continue;
                }
                let other = triangles[u];
                // Only a neighbour running the edge the other way keeps the winding.
                let Some(j) = (0..3).find(|&j| other[j] == v1 && other[(j + 1) % 3] == v0) else {
                    continue;
                };
                let g = other[(j + 2) % 3];
                if g == f {
                    continue;
                }
                let alignment = normals[t].dot(&normals[u]);
                if best.as_ref().map_or(true, |(score, _, _)| alignment > *score + EPSILON) {
                    best = Some((alignment, u, vec![f, v0, g, v1]));
                }
            }
        }
        if let Some((_, u, quad)) = best {
            used[t] = true;
            used[u] = true;
            quads.push(quad);
        }
    }

    let unpaired = triangles
        .iter()
        .zip(&used)
        .filter(|(_, u)| !**u)
        .map(|(t, _)| *t)
        .collect();
    (quads, unpaired)
}

/// Loops closing every open boundary, wound against the boundary half-edges.
fn boundary_holes(mesh: &HalfEdgeMesh) -> Vec<Vec<usize>> {
    let mut next: AHashMap<usize, usize> = AHashMap::new();
    let mut order = Vec::new();
    for he in mesh.half_edges().iter().filter(|he| he.opposite.is_none()) {
        if next.insert(he.origin, he.destination).is_none() {
            order.push(he.origin);
        }
    }

    let mut visited = AHashSet::new();
    let mut holes = Vec::new();
    for start in order {
        if visited.contains(&start) {
            continue;
        }
        let mut cycle = vec![start];
        visited.insert(start);
        let mut current = start;
        let closed = loop {
            let Some(&to) = next.get(&current) else {
                break false;
            };
            if to == start {
                break true;
            }
            if !visited.insert(to) {
                break false;
            }
            cycle.push(to);
            current = to;
        };
        if closed && cycle.len() >= 3 {
            cycle.reverse();
            holes.push(cycle);
        }
    }
    holes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    fn triangulated_box() -> Solid {
        let solid = Primitive::cube(1.0, 1.0, 1.0).to_solid(&Vec3::zeros()).unwrap();
        let mesh = solid.mesh();
        let mut loops = Vec::new();
        for face_loop in mesh.face_loops() {
            loops.push(vec![face_loop[0], face_loop[1], face_loop[2]]);
            loops.push(vec![face_loop[0], face_loop[2], face_loop[3]]);
        }
        let triangulated = HalfEdgeMesh::from_polygons(&mesh.positions(), &loops).unwrap();
        Solid::create_from_mesh(triangulated).unwrap()
    }

    #[test]
    fn test_triangle_pairs_become_quads() {
        let mut solid = triangulated_box();
        assert_eq!(solid.mesh().face_count(), 12);
        QuadTools::retopologize_to_quads(&mut solid, &QuadConversionOptions::default()).unwrap();
        assert_eq!(solid.mesh().face_count(), 6);
        assert!(solid.mesh().face_loops().iter().all(|l| l.len() == 4));
        assert!(solid.mesh().is_closed());
    }

    #[test]
    fn test_even_ngon_fan_split() {
        let (quads, leftover) = fan_split(&[0, 1, 2, 3, 4, 5]);
        assert_eq!(quads, vec![vec![0, 1, 2, 3], vec![0, 3, 4, 5]]);
        assert!(leftover.is_none());

        let (quads, leftover) = fan_split(&[0, 1, 2, 3, 4]);
        assert_eq!(quads, vec![vec![0, 1, 2, 3]]);
        assert_eq!(leftover, Some([0, 3, 4]));
    }

    #[test]
    fn test_hexagonal_prism_is_all_quads() {
        let profile = crate::geometry::shapes::regular_polygon(&Vec3::zeros(), &Vec3::new(1.0, 0.0, 0.0), 6);
        let mut solid = Solid::create_from_profile(&profile, &Vec3::y(), true, true).unwrap();
        QuadTools::retopologize_to_quads(&mut solid, &QuadConversionOptions::default()).unwrap();
        // six sides plus two quads per cap
        assert_eq!(solid.mesh().face_count(), 6 + 2 * 2);
        assert!(solid.mesh().is_closed());
    }

    #[test]
    fn test_lone_triangle_fails_validation() {
        let positions = [Vec3::zeros(), Vec3::x(), Vec3::z()];
        let mesh = HalfEdgeMesh::from_polygons(&positions, &[vec![0, 2, 1]]).unwrap();
        let mut solid = Solid::create_from_mesh(mesh).unwrap();
        let options = QuadConversionOptions {
            fill_holes: false,
            ..Default::default()
        };
        assert!(matches!(
            QuadTools::retopologize_to_quads(&mut solid, &options),
            Err(KernelError::NonQuadFaces(1))
        ));
        assert_eq!(solid.mesh().face_count(), 1);

        let lenient = QuadConversionOptions {
            validate_topology: false,
            fill_holes: false,
            ..Default::default()
        };
        QuadTools::retopologize_to_quads(&mut solid, &lenient).unwrap();
        assert_eq!(solid.mesh().face_count(), 1);
    }

    #[test]
    fn test_open_box_hole_is_filled() {
        let rectangle = crate::geometry::shapes::rectangle(&Vec3::zeros(), 1.0, 1.0);
        let mut solid = Solid::create_from_profile(&rectangle, &Vec3::y(), true, false).unwrap();
        assert_eq!(solid.mesh().boundary_edge_count(), 4);
        QuadTools::retopologize_to_quads(&mut solid, &QuadConversionOptions::default()).unwrap();
        assert_eq!(solid.mesh().face_count(), 6);
        assert!(solid.mesh().is_closed());
    }
}
