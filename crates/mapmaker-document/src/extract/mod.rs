// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction module — decoding of image XObjects and the resource-graph walk
// that finds them.

pub mod decode;
pub mod walker;

pub use decode::{Channels, EncodedImage, decode_soft_mask};
pub use walker::EmbeddedImages;
