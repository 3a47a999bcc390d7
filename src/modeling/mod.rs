// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Modeling operators built on the half-edge kernel

pub mod cad;
pub mod clean;
pub mod cloth;
pub mod knife;
pub mod loft;
pub mod push_pull;
pub mod quad;
pub mod round_corner;
pub mod subd;
pub mod support;
pub mod surface;
pub mod vertex_tools;
pub mod weld;

pub use cad::{CADDesigner, PatternOptions, RevolveOptions, ShellOptions, SplitOptions, SweepOptions};
pub use clean::{Clean, CleanOptions};
pub use cloth::{ClothEngine, ClothOptions};
pub use knife::{BezierKnife, KnifeOptions};
pub use loft::{CurveIt, LoftOptions};
pub use push_pull::{PushAndPull, PushPullOptions};
pub use quad::{QuadConversionOptions, QuadTools};
pub use round_corner::{CornerOverride, CornerStyle, RoundCorner, RoundCornerOptions};
pub use subd::{SubD, SubdivisionOptions};
pub use surface::{Surface, SurfaceDrawOptions};
pub use vertex_tools::{SoftSelectionOptions, VertexTools};
pub use weld::{Weld, WeldOptions};
