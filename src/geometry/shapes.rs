// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Profile builders on the XZ plane
//!
//! All builders keep the `y` of their reference point and work in the
//! `(x, z)` plane, which is where sketch profiles live before extrusion.

use crate::utils::math::{lerp_vec, Vec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

const MIN_RADIUS: f64 = 1e-6;

/// Circular arc in the XZ plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcDefinition {
    pub center: Vec3,
    pub radius: f64,
    /// Radians, measured from +X towards +Z
    pub start_angle: f64,
    pub end_angle: f64,
    pub counter_clockwise: bool,
    /// Zero picks a count from the radius and sweep
    pub segments: usize,
}

impl ArcDefinition {
    pub fn from_center(center: Vec3, radius: f64, start_angle: f64, end_angle: f64, counter_clockwise: bool) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            start_angle: canonical_angle(start_angle),
            end_angle: canonical_angle(end_angle),
            counter_clockwise,
            segments: 0,
        }
    }

    /// Signed angular extent; positive when counter-clockwise.
    pub fn sweep(&self) -> f64 {
        sweep_between(self.start_angle, self.end_angle, self.counter_clockwise)
    }
}

/// Single cubic Bézier span
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BezierDefinition {
    pub p0: Vec3,
    pub h0: Vec3,
    pub h1: Vec3,
    pub p1: Vec3,
    pub segments: usize,
}

/// Angle of `point` around `center` in the XZ plane.
pub fn angle_between(center: &Vec3, point: &Vec3) -> f64 {
    (point.z - center.z).atan2(point.x - center.x)
}

fn canonical_angle(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

fn sweep_between(start: f64, end: f64, ccw: bool) -> f64 {
    if ccw {
        (end - start).rem_euclid(TAU)
    } else {
        -(start - end).rem_euclid(TAU)
    }
}

fn default_segment_count(radius: f64, sweep: f64) -> usize {
    let fraction = (sweep.abs() / TAU).max(0.25);
    let base = (radius.max(0.001) * 16.0 * fraction) as usize;
    base.max(12)
}

/// Closed circle through `radius_point`, starting at angle zero.
pub fn circle(center: &Vec3, radius_point: &Vec3, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(3);
    let radius = planar_distance(center, radius_point);
    if radius <= MIN_RADIUS {
        return Vec::new();
    }
    (0..segments)
        .map(|i| {
            let angle = i as f64 / segments as f64 * TAU;
            Vec3::new(center.x + angle.cos() * radius, center.y, center.z + angle.sin() * radius)
        })
        .collect()
}

/// Regular polygon with its first corner at `radius_point`.
pub fn regular_polygon(center: &Vec3, radius_point: &Vec3, sides: usize) -> Vec<Vec3> {
    if sides < 3 {
        return Vec::new();
    }
    let radius = planar_distance(center, radius_point);
    if radius <= MIN_RADIUS {
        return Vec::new();
    }
    let start = angle_between(center, radius_point);
    (0..sides)
        .map(|i| {
            let angle = start + TAU * i as f64 / sides as f64;
            Vec3::new(center.x + angle.cos() * radius, center.y, center.z + angle.sin() * radius)
        })
        .collect()
}

/// Axis-aligned rectangle centred on `center`.
pub fn rectangle(center: &Vec3, width: f64, depth: f64) -> Vec<Vec3> {
    let (hw, hd) = (width * 0.5, depth * 0.5);
    vec![
        Vec3::new(center.x - hw, center.y, center.z - hd),
        Vec3::new(center.x + hw, center.y, center.z - hd),
        Vec3::new(center.x + hw, center.y, center.z + hd),
        Vec3::new(center.x - hw, center.y, center.z + hd),
    ]
}

/// Open polyline along an arc, both end points included.
pub fn arc(definition: &ArcDefinition) -> Vec<Vec3> {
    let sweep = definition.sweep();
    if definition.radius.abs() <= MIN_RADIUS || sweep.abs() <= MIN_RADIUS {
        return Vec::new();
    }
    let segments = if definition.segments > 0 {
        definition.segments
    } else {
        default_segment_count(definition.radius, sweep)
    }
    .max(8);
    let step = sweep / segments as f64;
    (0..=segments)
        .map(|i| {
            let angle = definition.start_angle + step * i as f64;
            Vec3::new(
                definition.center.x + angle.cos() * definition.radius,
                definition.center.y,
                definition.center.z + angle.sin() * definition.radius,
            )
        })
        .collect()
}

/// Arc through three points, or `None` when they are collinear.
pub fn arc_through_points(start: &Vec3, mid: &Vec3, end: &Vec3) -> Option<ArcDefinition> {
    let (ax, ay) = (start.x, start.z);
    let (bx, by) = (mid.x, mid.z);
    let (cx, cy) = (end.x, end.z);
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-9 {
        return None;
    }
    let aa = ax * ax + ay * ay;
    let bb = bx * bx + by * by;
    let cc = cx * cx + cy * cy;
    let ux = (aa * (by - cy) + bb * (cy - ay) + cc * (ay - by)) / d;
    let uy = (aa * (cx - bx) + bb * (ax - cx) + cc * (bx - ax)) / d;
    let center = Vec3::new(ux, start.y, uy);
    let radius = planar_distance(&center, start);
    if radius <= MIN_RADIUS {
        return None;
    }

    let cross = (bx - ax) * (cy - by) - (by - ay) * (cx - bx);
    let counter_clockwise = cross > 0.0;
    let mut definition = ArcDefinition::from_center(
        center,
        radius,
        angle_between(&center, start),
        angle_between(&center, end),
        counter_clockwise,
    );
    definition.segments = default_segment_count(radius, definition.sweep());
    Some(definition)
}

/// Sample a cubic Bézier span with de Casteljau's construction.
pub fn bezier(definition: &BezierDefinition) -> Vec<Vec3> {
    let segments = definition.segments.max(8);
    (0..=segments)
        .map(|i| cubic_bezier_point(&definition.p0, &definition.h0, &definition.h1, &definition.p1, i as f64 / segments as f64))
        .collect()
}

pub fn cubic_bezier_point(p0: &Vec3, h0: &Vec3, h1: &Vec3, p1: &Vec3, t: f64) -> Vec3 {
    let a = lerp_vec(p0, h0, t);
    let b = lerp_vec(h0, h1, t);
    let c = lerp_vec(h1, p1, t);
    let ab = lerp_vec(&a, &b, t);
    let bc = lerp_vec(&b, &c, t);
    lerp_vec(&ab, &bc, t)
}

fn planar_distance(a: &Vec3, b: &Vec3) -> f64 {
    ((b.x - a.x).powi(2) + (b.z - a.z).powi(2)).sqrt()
}
