// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — scale derivation, orientation choice, page counts, and the
// crop rectangle of every tile.

pub mod planner;
pub mod tile;

pub use planner::{LayoutPlan, pages_along, pixels_per_mm, plan};
pub use tile::{PixelRect, Tile};
