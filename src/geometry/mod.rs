// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

mod analytics;
mod bbox;
mod halfedge;
pub mod mesh_utils;
mod primitives;
pub mod shapes;
pub mod transform;

pub use analytics::{analyze, signed_volume, MeshStats};
pub use bbox::BoundingBox;
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Triangle, Vertex};
pub use mesh_utils::Edge;
pub use primitives::Primitive;
