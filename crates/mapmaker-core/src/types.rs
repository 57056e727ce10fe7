// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Mapmaker: paper, grid scale, borders, overlaps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MapmakerError;

/// Millimetres in one inch. One map grid square prints as one inch.
pub const MM_PER_INCH: f64 = 25.4;

/// ISO 216 paper sizes available for tiled output.
///
/// Configuration carries the paper as a raw token; it is parsed with
/// [`FromStr`] only when a tiled layout needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    A4,
}

impl PaperSize {
    /// Every supported size, largest first.
    pub const ALL: [PaperSize; 5] = [Self::A0, Self::A1, Self::A2, Self::A3, Self::A4];

    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            Self::A0 => (841.0, 1189.0),
            Self::A1 => (594.0, 841.0),
            Self::A2 => (420.0, 594.0),
            Self::A3 => (297.0, 420.0),
            Self::A4 => (210.0, 297.0),
        }
    }

    pub fn width_mm(&self) -> f64 {
        self.dimensions_mm().0
    }

    pub fn height_mm(&self) -> f64 {
        self.dimensions_mm().1
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::A0 => "A0",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A3 => "A3",
            Self::A4 => "A4",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperSize {
    type Err = MapmakerError;

    /// Parse a paper token such as `A3` or `a3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|paper| paper.name().eq_ignore_ascii_case(token))
            .ok_or_else(|| MapmakerError::UnknownPaperSize(token.to_string()))
    }
}

/// Page orientation chosen for a tiled printout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Page (width, height) in millimetres for `paper` in this orientation.
    pub fn page_dimensions_mm(&self, paper: PaperSize) -> (f64, f64) {
        let (w, h) = paper.dimensions_mm();
        match self {
            Self::Portrait => (w, h),
            Self::Landscape => (h, w),
        }
    }
}

/// Physical scale of a map image: how many one-inch squares span it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub squares_wide: f64,
    pub squares_high: f64,
}

impl GridSpec {
    /// Build a grid, rejecting non-finite or non-positive square counts.
    pub fn new(squares_wide: f64, squares_high: f64) -> Result<Self, MapmakerError> {
        for (axis, value) in [("width", squares_wide), ("height", squares_high)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MapmakerError::InvalidGrid(format!(
                    "{} must be a positive number of squares, got {}",
                    axis, value
                )));
            }
        }
        Ok(Self {
            squares_wide,
            squares_high,
        })
    }

    /// Physical size of the grid in millimetres (width, height).
    pub fn size_mm(&self) -> (f64, f64) {
        (
            self.squares_wide * MM_PER_INCH,
            self.squares_high * MM_PER_INCH,
        )
    }
}

impl FromStr for GridSpec {
    type Err = MapmakerError;

    /// Parse a `WxH` token such as `12x8`, `12.5x8` or `.5x3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let (wide, high) = token
            .split_once(['x', 'X'])
            .ok_or_else(|| MapmakerError::InvalidGrid(format!("expected WxH, got '{}'", token)))?;

        let parse = |part: &str| {
            part.parse::<f64>().map_err(|err| {
                MapmakerError::InvalidGrid(format!("'{}' in '{}': {}", part, token, err))
            })
        };

        Self::new(parse(wide)?, parse(high)?)
    }
}

/// Per-edge page margins in millimetres, always given for portrait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderSpec {
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
}

impl BorderSpec {
    pub fn uniform(mm: f64) -> Self {
        Self {
            north: mm,
            east: mm,
            south: mm,
            west: mm,
        }
    }

    /// The same margins seen from a page turned to landscape: the portrait
    /// east edge becomes the top of the sheet.
    pub fn to_landscape(&self) -> Self {
        Self {
            north: self.east,
            east: self.south,
            south: self.west,
            west: self.north,
        }
    }

    /// Total horizontal margin (west + east).
    pub fn horizontal(&self) -> f64 {
        self.west + self.east
    }

    /// Total vertical margin (north + south).
    pub fn vertical(&self) -> f64 {
        self.north + self.south
    }
}

impl Default for BorderSpec {
    fn default() -> Self {
        Self::uniform(5.0)
    }
}

/// Extra image strip, in millimetres, repeated past the east and south edge
/// of each interior page so neighbouring sheets can be taped with slack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapSpec {
    pub east: f64,
    pub south: f64,
}

impl OverlapSpec {
    pub fn uniform(mm: f64) -> Self {
        Self { east: mm, south: mm }
    }

    pub fn none() -> Self {
        Self::uniform(0.0)
    }
}

impl Default for OverlapSpec {
    fn default() -> Self {
        Self::uniform(3.0)
    }
}

/// Inclusive, 1-based range of source pages to scan. `None` means "from the
/// first page" and "to the last page" respectively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub first: Option<u32>,
    pub last: Option<u32>,
}

impl PageRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn single(page: u32) -> Self {
        Self {
            first: Some(page),
            last: Some(page),
        }
    }

    /// Resolve against a document of `page_count` pages, returning the
    /// inclusive bounds or `None` if nothing falls inside the document.
    pub fn resolve(&self, page_count: u32) -> Option<(u32, u32)> {
        let first = self.first.unwrap_or(1).max(1);
        let last = self.last.unwrap_or(page_count).min(page_count);
        (first <= last).then_some((first, last))
    }
}

/// How a map image is turned into a printable document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Split across pages of a fixed paper size with trim and overlap guides.
    #[default]
    Tiled,
    /// One page sized exactly to the image plus its border.
    Single,
}
