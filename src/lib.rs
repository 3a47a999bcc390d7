// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshwright
//!
//! A half-edge mesh kernel with parametric solid-modeling operators.
//! Curves and solids live in a [`GeometryKernel`] arena; the operators in
//! [`modeling`] fillet, loft, thicken, cut, retopologize, subdivide, weld and
//! relax them.

pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod kernel;
pub mod modeling;
pub mod object;
pub mod utils;

pub use config::KernelConfig;
pub use error::{KernelError, KernelResult, TopologyError};
pub use geometry::{analyze, BoundingBox, HalfEdgeMesh, MeshStats, Primitive};
pub use kernel::{ExtrudeOptions, GeometryKernel, MeshBuffer, ObjectId, ShapeMetadata};
pub use object::{Curve, GeometryObject, ObjectType, Shape, Solid};
pub use utils::math::{Vec3, EPSILON};
