// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry kernel: the arena that owns every curve and solid

use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::geometry::HalfEdgeMesh;
use crate::object::{Curve, GeometryObject, ObjectType, Shape, Solid};
use crate::utils::math::{normalize_or, Vec3};
use ahash::AHashMap;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Stable handle of an object inside one kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// End caps generated by an extrusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtrudeOptions {
    pub cap_start: bool,
    pub cap_end: bool,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            cap_start: true,
            cap_end: true,
        }
    }
}

/// Parametric description recorded by primitive builders
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeMetadata {
    pub kind: String,
    pub parameters: BTreeMap<String, f64>,
}

impl ShapeMetadata {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
}

/// Working coordinate frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub origin: Vec3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Default for Axes {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            x: Vec3::x(),
            y: Vec3::y(),
            z: Vec3::z(),
        }
    }
}

/// Flat buffers handed to renderers and exporters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffer {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    /// Shared vertices, area-weighted normals and the triangle fan indices.
    pub fn from_mesh(mesh: &HalfEdgeMesh) -> Self {
        let to_f32 = |v: &Vec3| [v.x as f32, v.y as f32, v.z as f32];
        Self {
            positions: mesh.vertices().iter().map(|v| to_f32(&v.position)).collect(),
            normals: mesh.vertex_normals().iter().map(to_f32).collect(),
            indices: mesh
                .triangles()
                .iter()
                .flat_map(|t| t.indices)
                .map(|i| i as u32)
                .collect(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Owner of all geometry objects plus their side tables
#[derive(Debug, Clone)]
pub struct GeometryKernel {
    objects: Vec<GeometryObject>,
    next_id: u64,
    materials: AHashMap<ObjectId, String>,
    metadata: AHashMap<ObjectId, ShapeMetadata>,
    axes: Axes,
    config: KernelConfig,
}

impl GeometryKernel {
    /// Create a new kernel
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Create a kernel that uses the given tolerances
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
            materials: AHashMap::new(),
            metadata: AHashMap::new(),
            axes: Axes::default(),
            config,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Take ownership of a shape and return its id
    pub fn add_object(&mut self, shape: impl Into<Shape>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let object = GeometryObject::new(id, shape.into());
        debug!(%id, kind = %object.object_type(), "added object");
        self.objects.push(object);
        id
    }

    /// Sanitize `points` into a curve and register it
    pub fn add_curve(&mut self, points: &[Vec3]) -> KernelResult<ObjectId> {
        let curve = Curve::create_with_config(points, None, &self.config)?;
        Ok(self.add_object(curve))
    }

    /// Extrude a curve straight up by `height`
    pub fn extrude_curve(&mut self, curve: ObjectId, height: f64, options: ExtrudeOptions) -> KernelResult<ObjectId> {
        self.extrude_curve_along_vector(curve, &(Vec3::y() * height), options)
    }

    /// Extrude a curve along an arbitrary vector
    pub fn extrude_curve_along_vector(
        &mut self,
        curve: ObjectId,
        direction: &Vec3,
        options: ExtrudeOptions,
    ) -> KernelResult<ObjectId> {
        let profile = self.curve(curve)?.boundary_loop().to_vec();
        let solid = Solid::create_from_profile_with(
            &profile,
            direction,
            options.cap_start,
            options.cap_end,
            &self.config,
        )?;
        Ok(self.add_object(solid))
    }

    /// Deep copy of an object under a fresh id; material and metadata follow
    pub fn clone_object(&mut self, source: ObjectId) -> KernelResult<ObjectId> {
        let shape = self.get(source).ok_or(KernelError::ObjectNotFound(source))?.shape().clone();
        let id = self.add_object(shape);
        if let Some(material) = self.materials.get(&source).cloned() {
            self.materials.insert(id, material);
        }
        if let Some(meta) = self.metadata.get(&source).cloned() {
            self.metadata.insert(id, meta);
        }
        Ok(id)
    }

    /// Remove an object and its side-table entries; false when the id is unknown
    pub fn delete_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id() == id) else {
            return false;
        };
        self.objects.remove(index);
        self.materials.remove(&id);
        self.metadata.remove(&id);
        debug!(%id, "deleted object");
        true
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.materials.clear();
        self.metadata.clear();
    }

    /// Objects in insertion order
    pub fn objects(&self) -> &[GeometryObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GeometryObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GeometryObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn curve(&self, id: ObjectId) -> KernelResult<&Curve> {
        self.get(id)
            .ok_or(KernelError::ObjectNotFound(id))?
            .as_curve()
            .ok_or(KernelError::WrongObjectType {
                id,
                expected: ObjectType::Curve,
            })
    }

    pub fn curve_mut(&mut self, id: ObjectId) -> KernelResult<&mut Curve> {
        self.get_mut(id)
            .ok_or(KernelError::ObjectNotFound(id))?
            .as_curve_mut()
            .ok_or(KernelError::WrongObjectType {
                id,
                expected: ObjectType::Curve,
            })
    }

    pub fn solid(&self, id: ObjectId) -> KernelResult<&Solid> {
        self.get(id)
            .ok_or(KernelError::ObjectNotFound(id))?
            .as_solid()
            .ok_or(KernelError::WrongObjectType {
                id,
                expected: ObjectType::Solid,
            })
    }

    pub fn solid_mut(&mut self, id: ObjectId) -> KernelResult<&mut Solid> {
        self.get_mut(id)
            .ok_or(KernelError::ObjectNotFound(id))?
            .as_solid_mut()
            .ok_or(KernelError::WrongObjectType {
                id,
                expected: ObjectType::Solid,
            })
    }

    pub fn assign_material(&mut self, id: ObjectId, name: impl Into<String>) -> KernelResult<()> {
        if self.get(id).is_none() {
            return Err(KernelError::ObjectNotFound(id));
        }
        self.materials.insert(id, name.into());
        Ok(())
    }

    pub fn material(&self, id: ObjectId) -> Option<&str> {
        self.materials.get(&id).map(String::as_str)
    }

    pub fn materials(&self) -> &AHashMap<ObjectId, String> {
        &self.materials
    }

    pub fn set_shape_metadata(&mut self, id: ObjectId, metadata: ShapeMetadata) -> KernelResult<()> {
        if self.get(id).is_none() {
            return Err(KernelError::ObjectNotFound(id));
        }
        self.metadata.insert(id, metadata);
        Ok(())
    }

    pub fn shape_metadata(&self, id: ObjectId) -> Option<&ShapeMetadata> {
        self.metadata.get(&id)
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Set the working frame; the directions are orthonormalized (Gram-Schmidt)
    pub fn set_axes(&mut self, origin: Vec3, x_direction: Vec3, y_direction: Vec3) {
        let x = normalize_or(&x_direction, Vec3::x());
        let y_raw = y_direction - x * y_direction.dot(&x);
        let y = normalize_or(&y_raw, crate::utils::math::perpendicular(&x));
        let z = x.cross(&y);
        self.axes = Axes { origin, x, y, z };
    }

    pub fn reset_axes(&mut self) {
        self.axes = Axes::default();
    }

    /// Render buffers for one object
    pub fn build_mesh_buffer(&self, id: ObjectId) -> KernelResult<MeshBuffer> {
        let object = self.get(id).ok_or(KernelError::ObjectNotFound(id))?;
        Ok(MeshBuffer::from_mesh(object.mesh()))
    }

    /// Column-major 4x4 identity used by importers and exporters
    pub fn identity_transform() -> [f32; 16] {
        let mut out = [0.0f32; 16];
        out.copy_from_slice(Matrix4::<f32>::identity().as_slice());
        out
    }

    /// Build a mesh from a triangle list; invalid or conflicting triangles are skipped
    pub fn mesh_from_indexed_data(positions: &[Vec3], indices: &[u32]) -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::new();
        for p in positions {
            mesh.add_vertex(*p);
        }
        let mut skipped = 0usize;
        for tri in indices.chunks_exact(3) {
            let face = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if mesh.add_face(&face).is_err() {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(skipped, "skipped triangles while importing indexed data");
        }
        mesh
    }
}

impl Default for GeometryKernel {
    fn default() -> Self {
        Self::new()
    }
}
