// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mapmaker-document — Document processing for Mapmaker.
//
// Pulls embedded map images out of PDFs, plans how a map at a fixed physical
// scale spreads across sheets of paper, and assembles the tiles into a
// printable PDF with registration marks.

pub mod extract;
pub mod image;
pub mod layout;
pub mod pdf;
pub mod pipeline;

// Re-export the primary types so callers can use `mapmaker_document::MapPipeline` etc.
pub use crate::image::{Enhancer, PixelFormat, RasterImage};
pub use extract::EmbeddedImages;
pub use layout::{LayoutPlan, PixelRect, Tile, plan};
pub use pdf::{PrintDocument, SourceDocument, assemble_single, assemble_tiled};
pub use pipeline::MapPipeline;
