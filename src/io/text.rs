// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Whitespace-tagged text persistence
//!
//! One record per line:
//!
//! ```text
//! Curve <n> x0 y0 z0 ... xn yn zn
//! Solid <n> <height> x0 y0 z0 ... xn yn zn
//! ```
//!
//! Solids are stored as their base loop and height and come back as a
//! straight upward extrusion. Loading stops at end of input or at a line
//! equal to the terminator.

use crate::error::{KernelError, KernelResult};
use crate::kernel::{GeometryKernel, ObjectId};
use crate::object::{Curve, Shape, Solid};
use crate::utils::math::Vec3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

const CURVE_TAG: &str = "Curve";
const SOLID_TAG: &str = "Solid";

impl GeometryKernel {
    /// Write every object, one record per line.
    pub fn save_to_stream<W: Write>(&self, writer: &mut W) -> KernelResult<()> {
        let mut written = 0usize;
        for object in self.objects() {
            match object.shape() {
                Shape::Curve(curve) => {
                    write!(writer, "{} {}", CURVE_TAG, curve.len())?;
                    write_points(writer, curve.boundary_loop())?;
                }
                Shape::Solid(solid) => {
                    if solid.base_loop().len() < 3 {
                        warn!(id = %object.id(), "solid without base loop skipped");
                        continue;
                    }
                    write!(writer, "{} {} {}", SOLID_TAG, solid.base_loop().len(), solid.height())?;
                    write_points(writer, solid.base_loop())?;
                }
            }
            writeln!(writer)?;
            written += 1;
        }
        debug!(objects = written, "saved geometry");
        Ok(())
    }

    /// Append objects read from `reader` until end of input or `terminator`.
    ///
    /// Returns the ids of the new objects. A malformed record aborts the load;
    /// objects from earlier records stay registered.
    pub fn load_from_stream<R: BufRead>(&mut self, reader: R, terminator: &str) -> KernelResult<Vec<ObjectId>> {
        let mut loaded = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = index + 1;
            let trimmed = line.trim();
            if !terminator.is_empty() && trimmed == terminator {
                break;
            }
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let shape = self.parse_record(trimmed, number)?;
            loaded.push(self.add_object(shape));
        }
        debug!(objects = loaded.len(), "loaded geometry");
        Ok(loaded)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> KernelResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_to_stream(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> KernelResult<Vec<ObjectId>> {
        let reader = BufReader::new(File::open(path)?);
        self.load_from_stream(reader, "")
    }

    fn parse_record(&self, line: &str, number: usize) -> KernelResult<Shape> {
        let mut tokens = line.split_whitespace();
        let tag = tokens.next().unwrap_or_default();
        let parse_error = |message: String| KernelError::Parse { line: number, message };

        let count: usize = tokens
            .next()
            .ok_or_else(|| parse_error("missing point count".to_string()))?
            .parse()
            .map_err(|e| parse_error(format!("bad point count: {}", e)))?;

        match tag {
            CURVE_TAG => {
                let points = read_points(&mut tokens, count, number)?;
                let curve = Curve::create_with_config(&points, None, self.config())?;
                Ok(curve.into())
            }
            SOLID_TAG => {
                let height = next_number(&mut tokens, number, "height")?;
                let points = read_points(&mut tokens, count, number)?;
                let solid = Solid::create_from_profile_with(&points, &(Vec3::y() * height), true, true, self.config())?;
                Ok(solid.into())
            }
            other => Err(parse_error(format!("unknown record tag '{}'", other))),
        }
    }
}

fn write_points<W: Write>(writer: &mut W, points: &[Vec3]) -> std::io::Result<()> {
    for p in points {
        write!(writer, " {} {} {}", p.x, p.y, p.z)?;
    }
    Ok(())
}

fn next_number<'a>(tokens: &mut impl Iterator<Item = &'a str>, line: usize, what: &str) -> KernelResult<f64> {
    let token = tokens.next().ok_or_else(|| KernelError::Parse {
        line,
        message: format!("missing {}", what),
    })?;
    token.parse().map_err(|_| KernelError::Parse {
        line,
        message: format!("bad {} '{}'", what, token),
    })
}

fn read_points<'a>(tokens: &mut impl Iterator<Item = &'a str>, count: usize, line: usize) -> KernelResult<Vec<Vec3>> {
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let x = next_number(tokens, line, "coordinate")?;
        let y = next_number(tokens, line, "coordinate")?;
        let z = next_number(tokens, line, "coordinate")?;
        points.push(Vec3::new(x, y, z));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes::rectangle;
    use std::io::Cursor;

    fn sample_kernel() -> GeometryKernel {
        let mut kernel = GeometryKernel::new();
        let curve = kernel.add_curve(&rectangle(&Vec3::zeros(), 2.0, 1.0)).unwrap();
        kernel.extrude_curve(curve, 1.5, Default::default()).unwrap();
        kernel
    }

    #[test]
    fn test_stream_round_trip() {
        let kernel = sample_kernel();
        let mut buffer = Vec::new();
        kernel.save_to_stream(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("Curve 4"));
        assert!(text.contains("Solid 4 1.5"));

        let mut restored = GeometryKernel::new();
        let ids = restored.load_from_stream(Cursor::new(buffer), "").unwrap();
        assert_eq!(ids.len(), 2);
        let solid = restored.solid(ids[1]).unwrap();
        assert_eq!(solid.mesh().vertex_count(), 8);
        assert!((solid.height() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_terminator_stops_loading() {
        let input = "Curve 3 0 0 0 1 0 0 0 0 1\nEndGeometry\nCurve 3 0 0 0 2 0 0 0 0 2\n";
        let mut kernel = GeometryKernel::new();
        let ids = kernel.load_from_stream(Cursor::new(input), "EndGeometry").unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let input = "Curve 3 0 0 0 1 0 0 0 0 1\n\nCurve 3 0 0 0 x 0 0 0 0 1\n";
        let mut kernel = GeometryKernel::new();
        let err = kernel.load_from_stream(Cursor::new(input), "").unwrap_err();
        assert!(matches!(err, KernelError::Parse { line: 3, .. }));
        assert_eq!(kernel.len(), 1);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut kernel = GeometryKernel::new();
        let err = kernel.load_from_stream(Cursor::new("Sphere 1 0 0 0"), "").unwrap_err();
        assert!(err.to_string().contains("Sphere"));
        assert!(kernel.is_empty());
    }
}
