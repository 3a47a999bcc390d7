// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Text persistence and configuration through the filesystem

use anyhow::Result;
use meshwright::geometry::shapes::{rectangle, regular_polygon};
use meshwright::{analyze, ExtrudeOptions, GeometryKernel, KernelConfig, ObjectType, Vec3};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_scene_round_trip_through_file() -> Result<()> {
    let mut kernel = GeometryKernel::new();
    let square = kernel.add_curve(&rectangle(&Vec3::zeros(), 2.0, 1.0))?;
    let hexagon = kernel.add_curve(&regular_polygon(&Vec3::new(3.0, 0.0, 0.0), &Vec3::new(4.0, 0.0, 0.0), 6))?;
    kernel.extrude_curve(square, 0.5, ExtrudeOptions::default())?;
    kernel.extrude_curve(hexagon, 2.0, ExtrudeOptions::default())?;

    let file = NamedTempFile::new()?;
    kernel.save_to_file(file.path())?;

    let mut restored = GeometryKernel::new();
    let ids = restored.load_from_file(file.path())?;
    assert_eq!(ids.len(), kernel.len());

    for (original, loaded) in kernel.objects().iter().zip(restored.objects()) {
        assert_eq!(original.object_type(), loaded.object_type());
        let (a, b) = (analyze(original.mesh()), analyze(loaded.mesh()));
        assert_eq!(a.vertex_count, b.vertex_count);
        assert!((a.volume - b.volume).abs() < 1e-9);
        assert!((a.bbox.min - b.bbox.min).norm() < 1e-9);
    }
    assert_eq!(restored.objects()[3].object_type(), ObjectType::Solid);
    Ok(())
}

#[test]
fn test_malformed_file_keeps_earlier_objects() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "Curve 3 0 0 0 1 0 0 0 0 1")?;
    writeln!(file, "Solid 3 1.0 0 0 0 1 0")?;

    let mut kernel = GeometryKernel::new();
    assert!(kernel.load_from_file(file.path()).is_err());
    assert_eq!(kernel.len(), 1);
    Ok(())
}

#[test]
fn test_config_file_drives_kernel_tolerances() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "min_extrusion = 0.5")?;
    let config = KernelConfig::from_file(file.path())?;
    assert_eq!(config.min_extrusion, 0.5);
    assert_eq!(config.weld_epsilon, KernelConfig::default().weld_epsilon);

    let mut kernel = GeometryKernel::with_config(config);
    let curve = kernel.add_curve(&rectangle(&Vec3::zeros(), 1.0, 1.0))?;
    assert!(kernel.extrude_curve(curve, 0.25, ExtrudeOptions::default()).is_err());
    assert!(kernel.extrude_curve(curve, 1.0, ExtrudeOptions::default()).is_ok());
    Ok(())
}
