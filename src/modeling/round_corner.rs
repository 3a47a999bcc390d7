// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fillet and chamfer of curve corners

use crate::error::{KernelError, KernelResult};
use crate::geometry::transform::rotate_about_axis;
use crate::object::Curve;
use crate::utils::math::{lerp_vec, Vec3, EPSILON};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CornerStyle {
    #[default]
    Fillet,
    Chamfer,
}

/// Per-corner replacement of the global settings; `None` keeps the global value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerOverride {
    pub index: usize,
    pub radius: Option<f64>,
    pub segments: Option<usize>,
    pub style: Option<CornerStyle>,
    pub hard: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundCornerOptions {
    pub radius: f64,
    pub segments: usize,
    pub style: CornerStyle,
    pub tag_hard_edges: bool,
    pub overrides: Vec<CornerOverride>,
}

impl Default for RoundCornerOptions {
    fn default() -> Self {
        Self {
            radius: 0.1,
            segments: 6,
            style: CornerStyle::Fillet,
            tag_hard_edges: false,
            overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CornerSettings {
    radius: f64,
    segments: usize,
    style: CornerStyle,
    hard: bool,
}

/// Corner rounding on curves
pub struct RoundCorner;

impl RoundCorner {
    /// Round every corner of `curve` in place.
    pub fn fillet_curve(curve: &mut Curve, options: &RoundCornerOptions) -> KernelResult<()> {
        let (points, hardness) = Self::rounded_loop(curve, options)?;
        curve.rebuild_from_points(&points, Some(&hardness))
    }

    /// Round a copy of `curve`, leaving the original untouched.
    pub fn create_filleted(curve: &Curve, options: &RoundCornerOptions) -> KernelResult<Curve> {
        let (points, hardness) = Self::rounded_loop(curve, options)?;
        Curve::create_with_config(&points, Some(&hardness), curve.config())
    }

    fn rounded_loop(curve: &Curve, options: &RoundCornerOptions) -> KernelResult<(Vec<Vec3>, Vec<bool>)> {
        if curve.len() < 3 {
            return Err(KernelError::TooFewPoints {
                required: 3,
                found: curve.len(),
            });
        }
        Ok(build_rounded_loop(curve.boundary_loop(), options))
    }
}

/// Replace each corner of a closed loop by a fillet arc or chamfer segment.
///
/// Returns the new points and one hardness flag per point. Degenerate corners
/// are kept as they are; if fewer than three points come out the input loop is
/// returned unchanged.
pub fn build_rounded_loop(points: &[Vec3], options: &RoundCornerOptions) -> (Vec<Vec3>, Vec<bool>) {
    let n = points.len();
    if n < 3 {
        return (points.to_vec(), vec![options.tag_hard_edges; n]);
    }

    let overrides: AHashMap<usize, &CornerOverride> = options.overrides.iter().map(|o| (o.index, o)).collect();
    let settings_for = |index: usize| {
        let mut s = CornerSettings {
            radius: options.radius,
            segments: options.segments.max(1),
            style: options.style,
            hard: options.tag_hard_edges,
        };
        if let Some(o) = overrides.get(&index) {
            s.radius = o.radius.unwrap_or(s.radius);
            s.segments = o.segments.map_or(s.segments, |v| v.max(1));
            s.style = o.style.unwrap_or(s.style);
            s.hard = o.hard.unwrap_or(s.hard);
        }
        s
    };

    let mut result: Vec<Vec3> = Vec::with_capacity(n * (options.segments + 2));
    let mut hardness: Vec<bool> = Vec::with_capacity(result.capacity());
    let emit = |p: Vec3, hard: bool, result: &mut Vec<Vec3>, hardness: &mut Vec<bool>| {
        if result.last().map_or(true, |last| (last - p).norm() > EPSILON) {
            result.push(p);
            hardness.push(hard);
        }
    };

    let mut rounded = 0usize;
    for i in 0..n {
        let current = points[i];
        let to_prev = points[(i + n - 1) % n] - current;
        let to_next = points[(i + 1) % n] - current;
        let (len_prev, len_next) = (to_prev.norm(), to_next.norm());
        if len_prev <= EPSILON || len_next <= EPSILON {
            emit(current, options.tag_hard_edges, &mut result, &mut hardness);
            continue;
        }

        let settings = settings_for(i);
        let dir_prev = to_prev / len_prev;
        let dir_next = to_next / len_next;
        let theta = dir_prev.dot(&dir_next).clamp(-1.0, 1.0).acos();
        let (tan_half, sin_half) = ((theta * 0.5).tan(), (theta * 0.5).sin());
        if theta <= EPSILON || (std::f64::consts::PI - theta).abs() <= EPSILON || tan_half <= EPSILON {
            emit(current, settings.hard, &mut result, &mut hardness);
            continue;
        }

        // Trim at most half of each adjacent edge so neighbouring corners never cross.
        let radius = settings
            .radius
            .min(0.5 * len_prev * tan_half)
            .min(0.5 * len_next * tan_half);
        if radius <= EPSILON {
            emit(current, settings.hard, &mut result, &mut hardness);
            continue;
        }
        let tangent_distance = (radius / tan_half)
            .min(len_prev - EPSILON)
            .min(len_next - EPSILON)
            .max(radius * 0.2);

        let start = current + dir_prev * tangent_distance;
        let end = current + dir_next * tangent_distance;
        emit(start, settings.hard, &mut result, &mut hardness);

        match settings.style {
            CornerStyle::Chamfer => {
                for s in 1..settings.segments {
                    let t = s as f64 / settings.segments as f64;
                    emit(lerp_vec(&start, &end, t), settings.hard, &mut result, &mut hardness);
                }
            }
            CornerStyle::Fillet => {
                let bisector = (dir_prev + dir_next).normalize();
                let center = current + bisector * (radius / sin_half);
                let (start_vec, end_vec) = (start - center, end - center);
                let mut normal = start_vec.cross(&end_vec);
                if normal.norm_squared() <= EPSILON * EPSILON {
                    normal = dir_next.cross(&dir_prev);
                }
                let arc_angle = start_vec
                    .normalize()
                    .dot(&end_vec.normalize())
                    .clamp(-1.0, 1.0)
                    .acos();
                for s in 1..=settings.segments {
                    let angle = arc_angle * s as f64 / (settings.segments + 1) as f64;
                    emit(
                        rotate_about_axis(&start, &center, &normal, angle),
                        settings.hard,
                        &mut result,
                        &mut hardness,
                    );
                }
            }
        }
        emit(end, settings.hard, &mut result, &mut hardness);
        rounded += 1;
    }

    if result.len() > 1 && (result[0] - result[result.len() - 1]).norm() <= EPSILON {
        result.pop();
        hardness.pop();
    }
    if result.len() < 3 {
        return (points.to_vec(), vec![options.tag_hard_edges; n]);
    }
    debug!(corners = n, rounded, points = result.len(), "rounded loop");
    (result, hardness)
}
