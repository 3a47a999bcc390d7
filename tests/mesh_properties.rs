// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structural properties of the half-edge mesh and its operators

use anyhow::Result;
use meshwright::modeling::{SubD, SubdivisionOptions, Weld, WeldOptions};
use meshwright::{analyze, HalfEdgeMesh, Primitive, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_rejected_faces_leave_mesh_untouched() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut mesh = HalfEdgeMesh::new();
    for _ in 0..12 {
        mesh.add_vertex(Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)));
    }

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for _ in 0..400 {
        let len = rng.gen_range(2..6);
        // index 12 is out of range on purpose
        let face: Vec<usize> = (0..len).map(|_| rng.gen_range(0..13)).collect();
        let before = (mesh.vertex_count(), mesh.face_count(), mesh.half_edge_count(), mesh.triangles().len());
        match mesh.add_face(&face) {
            Ok(_) => {
                accepted += 1;
                assert_eq!(mesh.face_count(), before.1 + 1);
                assert_eq!(mesh.half_edge_count(), before.2 + face.len());
            }
            Err(_) => {
                rejected += 1;
                let after = (mesh.vertex_count(), mesh.face_count(), mesh.half_edge_count(), mesh.triangles().len());
                assert_eq!(before, after, "rejected loop {:?} changed the mesh", face);
            }
        }
        assert!(mesh.is_manifold());
    }
    assert!(accepted > 0);
    assert!(rejected > 0);
    Ok(())
}

#[test]
fn test_heal_is_idempotent() -> Result<()> {
    let sphere = Primitive::sphere(2.0, 24, 12).to_solid(&Vec3::zeros())?;
    let mut once = sphere.mesh().clone();
    once.heal(1e-5, 1e-5);
    let mut twice = once.clone();
    twice.heal(1e-5, 1e-5);

    assert_eq!(once.vertex_count(), twice.vertex_count());
    assert_eq!(once.face_count(), twice.face_count());
    assert_eq!(once.positions(), twice.positions());
    assert!(twice.is_closed());
    Ok(())
}

#[test]
fn test_weld_never_adds_vertices() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut sphere = Primitive::sphere(5.0, 32, 16).to_solid(&Vec3::zeros())?;
    for v in sphere.mesh_mut().vertices_mut() {
        v.position += Vec3::new(rng.gen_range(-1e-3..1e-3), rng.gen_range(-1e-3..1e-3), rng.gen_range(-1e-3..1e-3));
    }
    sphere.mesh_mut().recompute_normals();

    let mut previous = sphere.mesh().vertex_count();
    for tolerance in [1e-6, 1e-4, 1e-2, 5e-2] {
        let mut welded = sphere.clone();
        let options = WeldOptions {
            tolerance,
            ..Default::default()
        };
        Weld::apply_solid(&mut welded, &options)?;
        let count = welded.mesh().vertex_count();
        assert!(count <= previous, "tolerance {tolerance} gave {count} > {previous}");
        previous = count;
    }
    Ok(())
}

#[test]
fn test_subdivision_adds_one_vertex_per_element() -> Result<()> {
    let mut cylinder = Primitive::cylinder(1.0, 2.0, 8).to_solid(&Vec3::zeros())?;
    let mesh = cylinder.mesh();
    let expected = mesh.vertex_count() + mesh.half_edge_count() / 2 + mesh.face_count();
    SubD::subdivide(&mut cylinder, &SubdivisionOptions::default())?;
    assert_eq!(cylinder.mesh().vertex_count(), expected);
    assert!(cylinder.mesh().face_loops().iter().all(|l| l.len() == 4));
    Ok(())
}

#[test]
fn test_subdivision_growth_on_closed_box() -> Result<()> {
    for levels in 1..=3usize {
        let mut cube = Primitive::cube(1.0, 1.0, 1.0).to_solid(&Vec3::zeros())?;
        let options = SubdivisionOptions {
            levels,
            ..Default::default()
        };
        SubD::subdivide(&mut cube, &options)?;
        let mesh = cube.mesh();
        let expected_faces = 6 * 4usize.pow(levels as u32);
        assert_eq!(mesh.face_count(), expected_faces);
        // Euler characteristic of a closed quad sphere
        assert_eq!(mesh.vertex_count(), expected_faces + 2);
        assert!(mesh.is_closed());
        assert!(mesh.face_loops().iter().all(|l| l.len() == 4));
        assert!(analyze(mesh).volume < 1.0);
    }
    Ok(())
}
