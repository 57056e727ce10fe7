// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading source documents, registration marks, and assembling
// the printable output.

pub mod marks;
pub mod reader;
pub mod writer;

pub use marks::{Tick, TickStyle, tile_marks};
pub use reader::SourceDocument;
pub use writer::{PrintDocument, PrintPage, assemble_single, assemble_tiled};
