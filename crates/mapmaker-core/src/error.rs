// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Mapmaker.

use thiserror::Error;

/// Top-level error type for all Mapmaker operations.
///
/// Every variant here is fatal for the run that produced it. Per-image
/// problems found while scanning a source document (an undecodable bitmap, a
/// soft mask of the wrong size) are logged and skipped, never reported here.
#[derive(Debug, Error)]
pub enum MapmakerError {
    // -- Source document errors --
    #[error("cannot open source document: {0}")]
    DocumentOpen(String),

    #[error("cannot decrypt source document: {0}")]
    Decryption(String),

    #[error("malformed source document: {0}")]
    MalformedDocument(String),

    // -- Input errors --
    #[error("invalid grid specification: {0}")]
    InvalidGrid(String),

    #[error("unknown paper size: {0}")]
    UnknownPaperSize(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("invalid page layout: {0}")]
    InvalidLayout(String),

    // -- Processing errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("enhancer unavailable: {0}")]
    EnhancerUnavailable(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MapmakerError>;
