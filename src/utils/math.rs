// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::Vector3;

/// Positions and directions share one vector type.
pub type Vec3 = Vector3<f64>;

/// Shared geometric epsilon used by the modeling operators.
pub const EPSILON: f64 = 1e-5;

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Clamp a value between min and max
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Component-wise interpolation between two points
pub fn lerp_vec(a: &Vec3, b: &Vec3, t: f64) -> Vec3 {
    a + (b - a) * t
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Convert radians to degrees
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / std::f64::consts::PI
}

/// Normalize `v`, or return `fallback` when its length is below [`EPSILON`].
pub fn normalize_or(v: &Vec3, fallback: Vec3) -> Vec3 {
    let len = v.norm();
    if len <= EPSILON {
        fallback
    } else {
        v / len
    }
}

/// Any unit vector perpendicular to `v`.
pub fn perpendicular(v: &Vec3) -> Vec3 {
    let axis = if v.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    normalize_or(&v.cross(&axis), Vec3::z())
}

/// Arithmetic mean of a point set; the origin for an empty slice.
pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::zeros();
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p);
    sum / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0001, 0.001));
        assert!(!approx_eq(1.0, 1.1, 0.001));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp_vec(&Vec3::zeros(), &Vec3::new(2.0, 4.0, 6.0), 0.5), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_angle_conversion() {
        let rad = deg_to_rad(180.0);
        assert!(approx_eq(rad, std::f64::consts::PI, 1e-9));
        assert!(approx_eq(rad_to_deg(rad), 180.0, 1e-9));
    }

    #[test]
    fn test_perpendicular_is_orthogonal_unit() {
        for v in [Vec3::x(), Vec3::y(), Vec3::new(1.0, 2.0, -3.0)] {
            let p = perpendicular(&v);
            assert!(approx_eq(p.norm(), 1.0, 1e-9));
            assert!(p.dot(&v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_fallback() {
        assert_eq!(normalize_or(&Vec3::zeros(), Vec3::y()), Vec3::y());
        assert_eq!(centroid(&[]), Vec3::zeros());
    }
}
