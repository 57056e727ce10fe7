// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-layout planner — works out how a physical-scale map is spread across
// sheets of a fixed paper size: orientation, page counts, and the per-page
// stride once interior overlaps are taken out.

use mapmaker_core::error::{MapmakerError, Result};
use mapmaker_core::types::{BorderSpec, GridSpec, MM_PER_INCH, Orientation, OverlapSpec, PaperSize};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::tile::{PixelRect, Tile};

/// Slack for floating point noise when checking that the last page reaches
/// the image edge.
const COVERAGE_EPSILON_MM: f64 = 1e-9;

/// Everything needed to crop and place the tiles of one map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub orientation: Orientation,
    pub paper: PaperSize,
    pub pages_horizontal: u32,
    pub pages_vertical: u32,
    pub pixels_per_mm: f64,
    /// Horizontal distance between the origins of neighbouring tiles, mm.
    pub page_width_mm: f64,
    /// Vertical distance between the origins of neighbouring tiles, mm.
    pub page_height_mm: f64,
    pub printable_width_mm: f64,
    pub printable_height_mm: f64,
    /// Margins of the sheet as printed (already turned for landscape).
    pub border: BorderSpec,
    /// Overlap along each axis as printed; zero on an axis with one page.
    pub overlap: OverlapSpec,
    pub image_width_px: u32,
    pub image_height_px: u32,
}

/// Pixels per millimetre for an image of the given size covering `grid`.
///
/// The limiting axis wins, so squares stay square and never print larger
/// than one inch.
pub fn pixels_per_mm(width_px: u32, height_px: u32, grid: &GridSpec) -> f64 {
    let (width_mm, height_mm) = grid.size_mm();
    debug_assert!(width_mm > 0.0 && height_mm > 0.0);
    (f64::from(width_px) / width_mm).min(f64::from(height_px) / height_mm)
}

/// Number of pages needed to cover `size_mm` when each page prints
/// `printable_mm` and interior pages repeat `overlap_mm` of their neighbour.
///
/// A size that fits one page needs one page. Otherwise the count is
/// `ceil(size / (printable + overlap))`, raised as needed so the final page
/// still reaches the far edge with the overlap taken out of every stride.
pub fn pages_along(size_mm: f64, printable_mm: f64, overlap_mm: f64) -> u32 {
    if (size_mm / printable_mm).ceil() <= 1.0 {
        return 1;
    }

    let mut pages = ((size_mm / (printable_mm + overlap_mm)).ceil() as u32).max(2);
    let stride = printable_mm - overlap_mm;
    while f64::from(pages) * stride + overlap_mm < size_mm - COVERAGE_EPSILON_MM {
        pages += 1;
    }

    debug!(size_mm, printable_mm, overlap_mm, pages, "pages_along");
    pages
}

/// Drop trailing pages whose tile would start on or past the image edge
/// once tile boundaries are rounded to whole pixels. Only a sub-pixel
/// overlap can produce one; the previous tile then runs to the edge.
fn without_empty_tail(pages: u32, stride_px: f64, limit_px: u32) -> u32 {
    let mut pages = pages;
    while pages > 1 && (f64::from(pages - 1) * stride_px).round() >= f64::from(limit_px) {
        pages -= 1;
    }
    pages
}

/// One orientation's worth of arithmetic, kept so the two can be compared.
struct Candidate {
    orientation: Orientation,
    border: BorderSpec,
    overlap: OverlapSpec,
    printable_width: f64,
    printable_height: f64,
    pages_horizontal: u32,
    pages_vertical: u32,
}

impl Candidate {
    fn evaluate(
        orientation: Orientation,
        paper: PaperSize,
        border: BorderSpec,
        overlap: OverlapSpec,
        (width_px, height_px): (u32, u32),
        pixels_per_mm: f64,
    ) -> Result<Self> {
        let (page_width, page_height) = orientation.page_dimensions_mm(paper);
        let printable_width = page_width - border.horizontal();
        let printable_height = page_height - border.vertical();

        for (axis, printable, overlap_mm) in [
            ("width", printable_width, overlap.east),
            ("height", printable_height, overlap.south),
        ] {
            if printable <= 0.0 {
                return Err(MapmakerError::InvalidLayout(format!(
                    "borders leave no printable {} on {} {:?}",
                    axis, paper, orientation
                )));
            }
            if overlap_mm >= printable {
                return Err(MapmakerError::InvalidLayout(format!(
                    "overlap of {}mm is not smaller than the printable {} of {}mm on {} {:?}",
                    overlap_mm, axis, printable, paper, orientation
                )));
            }
        }

        Ok(Self {
            orientation,
            border,
            overlap,
            printable_width,
            printable_height,
            pages_horizontal: without_empty_tail(
                pages_along(f64::from(width_px) / pixels_per_mm, printable_width, overlap.east),
                (printable_width - overlap.east) * pixels_per_mm,
                width_px,
            ),
            pages_vertical: without_empty_tail(
                pages_along(f64::from(height_px) / pixels_per_mm, printable_height, overlap.south),
                (printable_height - overlap.south) * pixels_per_mm,
                height_px,
            ),
        })
    }

    fn total(&self) -> u32 {
        self.pages_horizontal * self.pages_vertical
    }
}

/// Plan the tiled printout of a `width_px` x `height_px` image covering
/// `grid` squares.
///
/// Portrait is kept unless landscape needs strictly fewer pages.
#[instrument(skip(grid, border, overlap), fields(width_px, height_px, paper = %paper))]
pub fn plan(
    width_px: u32,
    height_px: u32,
    grid: &GridSpec,
    paper: PaperSize,
    border: &BorderSpec,
    overlap: &OverlapSpec,
) -> Result<LayoutPlan> {
    if width_px == 0 || height_px == 0 {
        return Err(MapmakerError::InvalidLayout(format!(
            "image has no pixels ({}x{})",
            width_px, height_px
        )));
    }
    for value in [border.north, border.east, border.south, border.west, overlap.east, overlap.south] {
        if !value.is_finite() || value < 0.0 {
            return Err(MapmakerError::InvalidLayout(format!(
                "borders and overlaps must be non-negative, got {}",
                value
            )));
        }
    }

    let pixels_per_mm = pixels_per_mm(width_px, height_px, grid);
    let width_mm = f64::from(width_px) / pixels_per_mm;
    let height_mm = f64::from(height_px) / pixels_per_mm;
    info!(
        pixels_per_mm,
        width_mm, height_mm, "Calculated physical size of image"
    );

    let portrait = Candidate::evaluate(
        Orientation::Portrait,
        paper,
        *border,
        *overlap,
        (width_px, height_px),
        pixels_per_mm,
    )?;
    // Turning the sheet puts the portrait south overlap along the width.
    let landscape = Candidate::evaluate(
        Orientation::Landscape,
        paper,
        border.to_landscape(),
        OverlapSpec {
            east: overlap.south,
            south: overlap.east,
        },
        (width_px, height_px),
        pixels_per_mm,
    )?;

    debug!(
        portrait_total = portrait.total(),
        landscape_total = landscape.total(),
        "Compared orientations"
    );

    let chosen = if landscape.total() < portrait.total() {
        landscape
    } else {
        portrait
    };

    let overlap = OverlapSpec {
        east: if chosen.pages_horizontal == 1 {
            0.0
        } else {
            chosen.overlap.east
        },
        south: if chosen.pages_vertical == 1 {
            0.0
        } else {
            chosen.overlap.south
        },
    };

    info!(
        orientation = ?chosen.orientation,
        pages_horizontal = chosen.pages_horizontal,
        pages_vertical = chosen.pages_vertical,
        "Layout planned"
    );

    Ok(LayoutPlan {
        orientation: chosen.orientation,
        paper,
        pages_horizontal: chosen.pages_horizontal,
        pages_vertical: chosen.pages_vertical,
        pixels_per_mm,
        page_width_mm: chosen.printable_width - overlap.east,
        page_height_mm: chosen.printable_height - overlap.south,
        printable_width_mm: chosen.printable_width,
        printable_height_mm: chosen.printable_height,
        border: chosen.border,
        overlap,
        image_width_px: width_px,
        image_height_px: height_px,
    })
}

impl LayoutPlan {
    pub fn page_count(&self) -> u32 {
        self.pages_horizontal * self.pages_vertical
    }

    /// Sheet (width, height) in mm in the chosen orientation.
    pub fn page_size_mm(&self) -> (f64, f64) {
        self.orientation.page_dimensions_mm(self.paper)
    }

    pub fn image_width_mm(&self) -> f64 {
        f64::from(self.image_width_px) / self.pixels_per_mm
    }

    pub fn image_height_mm(&self) -> f64 {
        f64::from(self.image_height_px) / self.pixels_per_mm
    }

    pub fn is_last_column(&self, page_x: u32) -> bool {
        page_x + 1 >= self.pages_horizontal
    }

    pub fn is_last_row(&self, page_y: u32) -> bool {
        page_y + 1 >= self.pages_vertical
    }

    /// Crop rectangles for every page, column by column (`x` outer, `y`
    /// inner).
    ///
    /// Each tile starts on its stride boundary and runs one stride plus the
    /// overlap further, stopping at the image edge.
    pub fn tiles(&self) -> Vec<Tile> {
        let stride_x = self.page_width_mm * self.pixels_per_mm;
        let stride_y = self.page_height_mm * self.pixels_per_mm;
        let overlap_x = self.overlap.east * self.pixels_per_mm;
        let overlap_y = self.overlap.south * self.pixels_per_mm;

        let mut tiles = Vec::with_capacity(self.page_count() as usize);
        for page_x in 0..self.pages_horizontal {
            let (x, width) = span(
                page_x,
                self.pages_horizontal,
                stride_x,
                overlap_x,
                self.image_width_px,
            );
            for page_y in 0..self.pages_vertical {
                let (y, height) = span(
                    page_y,
                    self.pages_vertical,
                    stride_y,
                    overlap_y,
                    self.image_height_px,
                );
                tiles.push(Tile {
                    page_x,
                    page_y,
                    rect: PixelRect {
                        x,
                        y,
                        width,
                        height,
                    },
                });
            }
        }
        tiles
    }
}

/// Start and length, in pixels, of tile `index` of `count` along one axis.
fn span(index: u32, count: u32, stride_px: f64, overlap_px: f64, limit: u32) -> (u32, u32) {
    let start = ((f64::from(index) * stride_px).round() as u32).min(limit);
    let end = if index + 1 == count {
        limit
    } else {
        ((f64::from(index + 1) * stride_px + overlap_px).round() as u32).min(limit)
    };
    (start, end.saturating_sub(start))
}
