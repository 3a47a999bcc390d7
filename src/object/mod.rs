// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel-owned geometry objects
//!
//! Every object carries an id plus selection and visibility flags, and wraps
//! exactly one [`Shape`]: a closed [`Curve`] or a volumetric [`Solid`].

mod curve;
mod solid;

pub use curve::Curve;
pub use solid::Solid;

use crate::geometry::HalfEdgeMesh;
use crate::kernel::ObjectId;
use crate::utils::math::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of [`Shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Curve,
    Solid,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Curve => write!(f, "curve"),
            Self::Solid => write!(f, "solid"),
        }
    }
}

/// Geometry payload of an object
#[derive(Debug, Clone)]
pub enum Shape {
    Curve(Curve),
    Solid(Solid),
}

impl Shape {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Curve(_) => ObjectType::Curve,
            Self::Solid(_) => ObjectType::Solid,
        }
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        match self {
            Self::Curve(curve) => curve.mesh(),
            Self::Solid(solid) => solid.mesh(),
        }
    }

    pub fn translate(&mut self, delta: &Vec3) {
        match self {
            Self::Curve(curve) => curve.translate(delta),
            Self::Solid(solid) => solid.translate(delta),
        }
    }

    pub fn rotate(&mut self, pivot: &Vec3, axis: &Vec3, radians: f64) {
        match self {
            Self::Curve(curve) => curve.rotate(pivot, axis, radians),
            Self::Solid(solid) => solid.rotate(pivot, axis, radians),
        }
    }

    pub fn scale(&mut self, pivot: &Vec3, factors: &Vec3) {
        match self {
            Self::Curve(curve) => curve.scale(pivot, factors),
            Self::Solid(solid) => solid.scale(pivot, factors),
        }
    }
}

impl From<Curve> for Shape {
    fn from(curve: Curve) -> Self {
        Self::Curve(curve)
    }
}

impl From<Solid> for Shape {
    fn from(solid: Solid) -> Self {
        Self::Solid(solid)
    }
}

/// An object stored in a [`GeometryKernel`](crate::kernel::GeometryKernel)
#[derive(Debug, Clone)]
pub struct GeometryObject {
    id: ObjectId,
    shape: Shape,
    selected: bool,
    visible: bool,
}

impl GeometryObject {
    pub(crate) fn new(id: ObjectId, shape: Shape) -> Self {
        Self {
            id,
            shape,
            selected: false,
            visible: true,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn object_type(&self) -> ObjectType {
        self.shape.object_type()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        self.shape.mesh()
    }

    pub fn as_curve(&self) -> Option<&Curve> {
        match &self.shape {
            Shape::Curve(curve) => Some(curve),
            Shape::Solid(_) => None,
        }
    }

    pub fn as_curve_mut(&mut self) -> Option<&mut Curve> {
        match &mut self.shape {
            Shape::Curve(curve) => Some(curve),
            Shape::Solid(_) => None,
        }
    }

    pub fn as_solid(&self) -> Option<&Solid> {
        match &self.shape {
            Shape::Solid(solid) => Some(solid),
            Shape::Curve(_) => None,
        }
    }

    pub fn as_solid_mut(&mut self) -> Option<&mut Solid> {
        match &mut self.shape {
            Shape::Solid(solid) => Some(solid),
            Shape::Curve(_) => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
