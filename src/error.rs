// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for mesh construction and modeling operations.

use crate::kernel::ObjectId;
use crate::object::ObjectType;
use thiserror::Error;

/// Reasons a face loop can be refused by [`HalfEdgeMesh::add_face`](crate::geometry::HalfEdgeMesh::add_face).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Fewer than three vertices in the loop.
    #[error("face loop needs at least 3 vertices, got {0}")]
    LoopTooShort(usize),

    /// A loop index does not name an existing vertex.
    #[error("vertex index {index} out of range (mesh has {count} vertices)")]
    VertexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// Two consecutive loop entries name the same vertex.
    #[error("degenerate edge at vertex {0}")]
    DegenerateEdge(usize),

    /// The directed edge is already owned by another face (or repeated inside the loop).
    #[error("directed edge {from} -> {to} already exists")]
    DuplicateDirectedEdge {
        /// Origin vertex.
        from: usize,
        /// Destination vertex.
        to: usize,
    },
}

/// Errors produced by the geometry kernel and modeling operators.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Input polygon or path is too short after cleanup.
    #[error("need at least {required} points, got {found}")]
    TooFewPoints {
        /// Minimum number of points.
        required: usize,
        /// Number of points after sanitizing.
        found: usize,
    },

    /// A direction or extrusion vector has (near) zero length.
    #[error("degenerate {0}: vector length is ~0")]
    DegenerateVector(&'static str),

    /// The mesh has no vertices or no faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Healing did not produce a manifold mesh.
    #[error("mesh is not manifold")]
    NonManifold,

    /// Face insertion was rejected.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// No object with this id lives in the kernel.
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// The object exists but is of the wrong kind.
    #[error("object {id} is not a {expected}")]
    WrongObjectType {
        /// Object that was looked up.
        id: ObjectId,
        /// Kind the operation needed.
        expected: ObjectType,
    },

    /// An option value is out of its usable range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A selection-driven edit did not reach any vertex.
    #[error("no vertex within {0} of the selection")]
    NothingAffected(f64),

    /// Retopology left faces that are not quads.
    #[error("{0} faces are not quads after retopology")]
    NonQuadFaces(usize),

    /// Face loops and face records disagree.
    #[error("irregular topology: {loops} loops for {faces} faces")]
    IrregularTopology {
        /// Face loops recovered by traversal.
        loops: usize,
        /// Face records stored in the mesh.
        faces: usize,
    },

    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed text geometry.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// Result type for kernel operations.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KernelError::TooFewPoints {
            required: 3,
            found: 2,
        };
        assert_eq!(format!("{err}"), "need at least 3 points, got 2");

        let err = KernelError::from(TopologyError::DuplicateDirectedEdge { from: 4, to: 7 });
        assert_eq!(format!("{err}"), "directed edge 4 -> 7 already exists");

        let err = KernelError::WrongObjectType {
            id: ObjectId(12),
            expected: ObjectType::Curve,
        };
        let display = format!("{err}");
        assert!(display.contains("#12"));
        assert!(display.contains("curve"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: KernelError = io.into();
        assert!(matches!(err, KernelError::Io(_)));
    }
}
