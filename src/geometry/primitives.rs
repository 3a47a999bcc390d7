// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::shapes;
use crate::error::{KernelError, KernelResult};
use crate::kernel::{GeometryKernel, ObjectId, ShapeMetadata};
use crate::object::Solid;
use crate::utils::math::Vec3;
use std::f64::consts::PI;

const MIN_DIMENSION: f64 = 0.001;

/// Geometric primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Box { width: f64, depth: f64, height: f64 },
    Plane { width: f64, depth: f64, thickness: f64 },
    Cylinder { radius: f64, height: f64, segments: usize },
    Sphere { radius: f64, segments: usize, rings: usize },
}

impl Primitive {
    pub fn cube(width: f64, depth: f64, height: f64) -> Self {
        Self::Box { width, depth, height }
    }

    pub fn plane(width: f64, depth: f64) -> Self {
        Self::Plane {
            width,
            depth,
            thickness: 0.01,
        }
    }

    pub fn cylinder(radius: f64, height: f64, segments: usize) -> Self {
        Self::Cylinder {
            radius,
            height,
            segments: segments.max(8),
        }
    }

    pub fn sphere(radius: f64, segments: usize, rings: usize) -> Self {
        Self::Sphere {
            radius,
            segments: segments.max(8),
            rings: rings.max(4),
        }
    }

    /// Build the solid centred on `center`.
    pub fn to_solid(&self, center: &Vec3) -> KernelResult<Solid> {
        match *self {
            Self::Box { width, depth, height } => extruded_box(width, depth, height, center),
            Self::Plane { width, depth, thickness } => extruded_box(width, depth, thickness, center),
            Self::Cylinder { radius, height, segments } => cylinder(radius, height, segments, center),
            Self::Sphere { radius, segments, rings } => sphere(radius, segments, rings, center),
        }
    }

    pub fn metadata(&self) -> ShapeMetadata {
        match *self {
            Self::Box { width, depth, height } => ShapeMetadata::new("box")
                .with("width", width)
                .with("depth", depth)
                .with("height", height),
            Self::Plane { width, depth, thickness } => ShapeMetadata::new("plane")
                .with("width", width)
                .with("depth", depth)
                .with("thickness", thickness),
            Self::Cylinder { radius, height, segments } => ShapeMetadata::new("cylinder")
                .with("radius", radius)
                .with("height", height)
                .with("segments", segments as f64),
            Self::Sphere { radius, segments, rings } => ShapeMetadata::new("sphere")
                .with("radius", radius)
                .with("segments", segments as f64)
                .with("rings", rings as f64),
        }
    }
}

impl GeometryKernel {
    /// Build a primitive, register it and record its parameters.
    pub fn add_primitive(&mut self, primitive: Primitive, center: &Vec3) -> KernelResult<ObjectId> {
        let solid = primitive.to_solid(center)?;
        let id = self.add_object(solid);
        self.set_shape_metadata(id, primitive.metadata())?;
        Ok(id)
    }
}

fn extruded_box(width: f64, depth: f64, height: f64, center: &Vec3) -> KernelResult<Solid> {
    let height = height.max(MIN_DIMENSION);
    let base = shapes::rectangle(&Vec3::zeros(), width.max(MIN_DIMENSION), depth.max(MIN_DIMENSION));
    let mut solid = Solid::create_from_profile(&base, &(Vec3::y() * height), true, true)?;
    solid.translate(&Vec3::new(center.x, center.y - height * 0.5, center.z));
    Ok(solid)
}

fn cylinder(radius: f64, height: f64, segments: usize, center: &Vec3) -> KernelResult<Solid> {
    let height = height.max(MIN_DIMENSION);
    let radius = radius.max(MIN_DIMENSION);
    let base = shapes::circle(&Vec3::zeros(), &Vec3::new(radius, 0.0, 0.0), segments.max(8));
    if base.is_empty() {
        return Err(KernelError::TooFewPoints { required: 3, found: 0 });
    }
    let mut solid = Solid::create_from_profile(&base, &(Vec3::y() * height), true, true)?;
    solid.translate(&Vec3::new(center.x, center.y - height * 0.5, center.z));
    Ok(solid)
}

/// UV sphere; pole and seam duplicates are merged when the mesh is healed.
fn sphere(radius: f64, segments: usize, rings: usize, center: &Vec3) -> KernelResult<Solid> {
    let radius = radius.max(MIN_DIMENSION);
    let segments = segments.max(8);
    let rings = rings.max(4);

    let mut positions = Vec::with_capacity((rings + 1) * (segments + 1));
    for ring in 0..=rings {
        let phi = ring as f64 / rings as f64 * PI;
        let (y, r) = (phi.cos() * radius, phi.sin() * radius);
        for seg in 0..=segments {
            let theta = seg as f64 / segments as f64 * PI * 2.0;
            positions.push(center + Vec3::new(theta.cos() * r, y, theta.sin() * r));
        }
    }

    let stride = (segments + 1) as u32;
    let mut indices = Vec::with_capacity(rings * segments * 6);
    for ring in 0..rings as u32 {
        for seg in 0..segments as u32 {
            let i0 = ring * stride + seg;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i1, i2, i1, i3, i2]);
        }
    }

    let mesh = GeometryKernel::mesh_from_indexed_data(&positions, &indices);
    Solid::create_from_mesh(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_is_centred() {
        let solid = Primitive::cube(2.0, 1.0, 4.0).to_solid(&Vec3::new(0.0, 5.0, 0.0)).unwrap();
        let ys: Vec<f64> = solid.mesh().positions().iter().map(|p| p.y).collect();
        let min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(min, 3.0, epsilon = 1e-12);
        assert_relative_eq!(max, 7.0, epsilon = 1e-12);
        assert!(solid.mesh().is_closed());
    }

    #[test]
    fn test_cylinder_counts() {
        let solid = Primitive::cylinder(0.5, 1.0, 16).to_solid(&Vec3::zeros()).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 32);
        assert_eq!(solid.mesh().face_count(), 18);
        assert!(solid.mesh().is_closed());
    }

    #[test]
    fn test_sphere_is_watertight_after_heal() {
        let solid = Primitive::sphere(1.0, 16, 8).to_solid(&Vec3::zeros()).unwrap();
        let mesh = solid.mesh();
        // two poles plus (rings - 1) interior rings
        assert_eq!(mesh.vertex_count(), 2 + 7 * 16);
        assert!(mesh.is_closed());
        for v in mesh.vertices() {
            assert_relative_eq!(v.position.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_kernel_records_metadata() {
        let mut kernel = GeometryKernel::new();
        let id = kernel.add_primitive(Primitive::cylinder(1.0, 2.0, 12), &Vec3::zeros()).unwrap();
        let meta = kernel.shape_metadata(id).unwrap();
        assert_eq!(meta.kind, "cylinder");
        assert_eq!(meta.parameters["segments"], 12.0);
    }
}
