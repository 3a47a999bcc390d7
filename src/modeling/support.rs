// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Loop, path and mesh helpers shared by the modeling operators

use crate::geometry::mesh_utils::{closest_point_on_triangle, triangle_normal};
use crate::geometry::shapes::cubic_bezier_point;
use crate::geometry::HalfEdgeMesh;
use crate::utils::math::{lerp_vec, Vec3, EPSILON};
use tracing::debug;

/// Surface hit from [`project_onto_mesh`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub position: Vec3,
    pub normal: Vec3,
}

fn cumulative_lengths(points: &[Vec3]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in points.windows(2) {
        total += (pair[1] - pair[0]).norm();
        cumulative.push(total);
    }
    cumulative
}

fn sample_at(points: &[Vec3], cumulative: &[f64], target: f64) -> Vec3 {
    let index = cumulative.partition_point(|&c| c < target).min(points.len() - 1);
    if index == 0 {
        return points[0];
    }
    let (start, end) = (cumulative[index - 1], cumulative[index]);
    let t = (target - start) / (end - start).max(EPSILON);
    lerp_vec(&points[index - 1], &points[index], t)
}

/// Resample a closed loop to `samples` points evenly spaced by arclength.
///
/// Loops shorter than three points come back empty; a loop with ~zero
/// perimeter is returned unchanged.
pub fn resample_loop(points: &[Vec3], samples: usize) -> Vec<Vec3> {
    if points.len() < 3 {
        return Vec::new();
    }
    let samples = samples.max(3);
    let mut closed = points.to_vec();
    if (closed[0] - closed[closed.len() - 1]).norm() > EPSILON {
        closed.push(closed[0]);
    }
    let cumulative = cumulative_lengths(&closed);
    let total = cumulative[cumulative.len() - 1];
    if total <= EPSILON {
        return points.to_vec();
    }
    let step = total / samples as f64;
    (0..samples).map(|s| sample_at(&closed, &cumulative, step * s as f64)).collect()
}

/// Resample an open path to `samples` points, both end points included.
pub fn resample_path(points: &[Vec3], samples: usize) -> Vec<Vec3> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let samples = samples.max(2);
    let cumulative = cumulative_lengths(points);
    let total = cumulative[cumulative.len() - 1];
    if total <= EPSILON {
        return points.to_vec();
    }
    let step = total / (samples - 1) as f64;
    (0..samples)
        .map(|s| sample_at(points, &cumulative, (step * s as f64).min(total)))
        .collect()
}

/// Insert evenly spaced points so no segment is longer than `spacing`.
pub fn densify_path(points: &[Vec3], spacing: f64) -> Vec<Vec3> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let spacing = spacing.max(1e-3);
    let mut result = Vec::with_capacity(points.len() * 2);
    result.push(points[0]);
    let push = |result: &mut Vec<Vec3>, p: Vec3| {
        if result.last().map_or(true, |last: &Vec3| (last - p).norm() > EPSILON) {
            result.push(p);
        }
    };
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = (b - a).norm();
        if length > spacing {
            let count = (length / spacing).floor() as usize;
            let step = 1.0 / (count + 1) as f64;
            for c in 1..=count {
                push(&mut result, lerp_vec(&a, &b, step * c as f64));
            }
        }
        push(&mut result, b);
    }
    result
}

/// Rotate (and possibly reverse) `candidate` so its points best match `reference`.
///
/// Every offset in both windings is scored by summed squared distance.
pub fn align_loop_order(reference: &[Vec3], candidate: &mut Vec<Vec3>) {
    let count = reference.len();
    if count < 3 || candidate.len() != count {
        return;
    }
    let score = |loop_points: &[Vec3], offset: usize| -> f64 {
        (0..count)
            .map(|i| (reference[i] - loop_points[(i + offset) % count]).norm_squared())
            .sum()
    };

    let reversed: Vec<Vec3> = candidate.iter().rev().copied().collect();
    let mut best = (f64::INFINITY, 0usize, false);
    for (flip, loop_points) in [(false, candidate.as_slice()), (true, reversed.as_slice())] {
        for offset in 0..count {
            let s = score(loop_points, offset);
            if s < best.0 {
                best = (s, offset, flip);
            }
        }
    }

    if best.2 {
        *candidate = reversed;
    }
    candidate.rotate_left(best.1);
}

/// Sample a chain of cubic spans sharing end points (`3k + 1` control points).
///
/// Other control-point counts are sampled as straight segments.
pub fn sample_bezier_path(control: &[Vec3], samples_per_segment: usize) -> Vec<Vec3> {
    if control.len() < 2 {
        return control.to_vec();
    }
    let samples = samples_per_segment.max(1);

    if control.len() >= 4 && (control.len() - 1) % 3 == 0 {
        let mut result = Vec::with_capacity((control.len() - 1) / 3 * samples + 1);
        result.push(control[0]);
        for span in control.windows(4).step_by(3) {
            for step in 1..=samples {
                let t = step as f64 / samples as f64;
                result.push(cubic_bezier_point(&span[0], &span[1], &span[2], &span[3], t));
            }
        }
        return result;
    }

    let mut result = Vec::with_capacity((control.len() - 1) * samples + 1);
    for pair in control.windows(2) {
        for step in 0..samples {
            result.push(lerp_vec(&pair[0], &pair[1], step as f64 / samples as f64));
        }
    }
    result.push(control[control.len() - 1]);
    result
}

/// Skin equally sized rings into quads.
///
/// The start cap is wound against the travel direction and the end cap with
/// it. `close_rails` joins the last ring back to the first. Returns an empty
/// mesh when the rings disagree in size.
pub fn build_skin_mesh(rings: &[Vec<Vec3>], close_rails: bool, cap_start: bool, cap_end: bool) -> HalfEdgeMesh {
    let Some(first) = rings.first() else {
        return HalfEdgeMesh::new();
    };
    let ring_size = first.len();
    if rings.len() < 2 || ring_size < 3 || rings.iter().any(|r| r.len() != ring_size) {
        return HalfEdgeMesh::new();
    }

    let positions: Vec<Vec3> = rings.iter().flatten().copied().collect();
    let index = |ring: usize, v: usize| ring * ring_size + v % ring_size;
    let last = rings.len() - 1;

    let mut loops: Vec<Vec<usize>> = Vec::with_capacity(rings.len() * ring_size + 2);
    if cap_start {
        loops.push((0..ring_size).rev().map(|v| index(0, v)).collect());
    }
    if cap_end {
        loops.push((0..ring_size).map(|v| index(last, v)).collect());
    }
    for ring in 0..last {
        for v in 0..ring_size {
            loops.push(vec![index(ring, v), index(ring, v + 1), index(ring + 1, v + 1), index(ring + 1, v)]);
        }
    }
    if close_rails && rings.len() > 2 {
        for v in 0..ring_size {
            loops.push(vec![index(last, v), index(last, v + 1), index(0, v + 1), index(0, v)]);
        }
    }

    let (mut mesh, dropped) = HalfEdgeMesh::from_polygons_lenient(&positions, &loops);
    if dropped > 0 {
        debug!(dropped, rings = rings.len(), "skin faces rejected");
    }
    mesh.heal(EPSILON, EPSILON);
    mesh
}

/// Move every vertex towards the average of its neighbours by `alpha`.
pub fn laplacian_smooth(mesh: &mut HalfEdgeMesh, passes: usize, alpha: f64) {
    if passes == 0 {
        return;
    }
    let alpha = alpha.clamp(0.01, 0.9);
    let adjacency = mesh.vertex_adjacency();
    for _ in 0..passes {
        let original = mesh.positions();
        for (vertex, neighbours) in mesh.vertices_mut().iter_mut().zip(&adjacency) {
            if neighbours.is_empty() {
                continue;
            }
            let average = neighbours.iter().map(|&n| original[n]).sum::<Vec3>() / neighbours.len() as f64;
            vertex.position = vertex.position * (1.0 - alpha) + average * alpha;
        }
    }
    mesh.recompute_normals();
}

/// Closest point on any triangle of `mesh`, with that triangle's normal.
///
/// `None` when the mesh has no triangles.
pub fn project_onto_mesh(mesh: &HalfEdgeMesh, point: &Vec3) -> Option<SurfaceHit> {
    let vertices = mesh.vertices();
    let mut best: Option<(f64, SurfaceHit)> = None;
    for tri in mesh.triangles() {
        let [a, b, c] = tri.indices.map(|i| vertices[i].position);
        let candidate = closest_point_on_triangle(point, &a, &b, &c);
        let distance = (candidate - point).norm_squared();
        if best.as_ref().map_or(true, |(d, _)| distance < *d) {
            let normal = if tri.normal.norm_squared() > EPSILON {
                tri.normal.normalize()
            } else {
                triangle_normal(&a, &b, &c)
            };
            best = Some((
                distance,
                SurfaceHit {
                    position: candidate,
                    normal,
                },
            ));
        }
    }
    best.map(|(_, hit)| hit)
}

/// Rebuild `mesh` from the faces accepted by `keep`, dropping unused vertices.
///
/// `keep` receives the face index and its vertex positions.
pub fn retain_faces(mesh: &HalfEdgeMesh, mut keep: impl FnMut(usize, &[Vec3]) -> bool) -> HalfEdgeMesh {
    let vertices = mesh.vertices();
    let mut remap = vec![usize::MAX; vertices.len()];
    let mut positions = Vec::new();
    let mut loops = Vec::new();
    for face in 0..mesh.face_count() {
        let face_loop = mesh.face_loop(face);
        if face_loop.len() < 3 {
            continue;
        }
        let face_positions: Vec<Vec3> = face_loop.iter().map(|&v| vertices[v].position).collect();
        if !keep(face, &face_positions) {
            continue;
        }
        let mapped: Vec<usize> = face_loop
            .iter()
            .map(|&v| {
                if remap[v] == usize::MAX {
                    remap[v] = positions.len();
                    positions.push(vertices[v].position);
                }
                remap[v]
            })
            .collect();
        loops.push(mapped);
    }
    HalfEdgeMesh::from_polygons_lenient(&positions, &loops).0
}
