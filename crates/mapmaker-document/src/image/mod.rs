// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — the raster type shared by every stage, and the optional
// enhancement hook.

pub mod enhance;
pub mod raster;

pub use enhance::{Enhancer, enhance_or_passthrough};
pub use raster::{PixelFormat, RasterImage};
