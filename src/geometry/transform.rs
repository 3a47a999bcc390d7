// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Affine helpers used by object transforms and the modeling operators

use crate::utils::math::{normalize_or, Vec3, EPSILON};
use nalgebra::{Matrix4, Rotation3, Unit};

/// Offset a point by `delta`.
pub fn translate(point: &Vec3, delta: &Vec3) -> Vec3 {
    point + delta
}

/// Rotate `point` about the line through `pivot` with direction `axis`.
///
/// A near-zero axis falls back to +Y.
pub fn rotate_about_axis(point: &Vec3, pivot: &Vec3, axis: &Vec3, radians: f64) -> Vec3 {
    let axis = Unit::new_normalize(normalize_or(axis, Vec3::y()));
    let rotation = Rotation3::from_axis_angle(&axis, radians);
    pivot + rotation * (point - pivot)
}

/// Non-uniform scale of `point` away from `pivot`.
pub fn scale_from_pivot(point: &Vec3, pivot: &Vec3, factors: &Vec3) -> Vec3 {
    pivot + (point - pivot).component_mul(factors)
}

/// Mirror `point` across the plane through `plane_point` with normal `plane_normal`.
pub fn reflect_across_plane(point: &Vec3, plane_point: &Vec3, plane_normal: &Vec3) -> Vec3 {
    let n = normalize_or(plane_normal, Vec3::y());
    let distance = (point - plane_point).dot(&n);
    point - n * (2.0 * distance)
}

/// Apply a homogeneous transform to a position.
pub fn transform_point(matrix: &Matrix4<f64>, point: &Vec3) -> Vec3 {
    let h = matrix * point.push(1.0);
    if h.w.abs() > EPSILON && (h.w - 1.0).abs() > EPSILON {
        Vec3::new(h.x / h.w, h.y / h.w, h.z / h.w)
    } else {
        h.xyz()
    }
}
