// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print document assembly — turns a planned layout (or a single oversized
// sheet) into pages, then serialises them with `printpdf` 0.8.
//
// Pages are kept as plain data (image, placement, ticks) until
// `to_pdf_bytes`, so the layout can be inspected without rendering a PDF.

use std::path::Path;

use mapmaker_core::error::{MapmakerError, Result};
use mapmaker_core::types::{BorderSpec, GridSpec, MM_PER_INCH};
use printpdf::{
    Line, LineDashPattern, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg,
    Point, Pt, RawImage, RawImageData, RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use super::marks::{Tick, TickStyle, tile_marks};
use crate::image::{PixelFormat, RasterImage};
use crate::layout::{LayoutPlan, Tile, pixels_per_mm};

/// Stroke width of registration ticks.
const TICK_THICKNESS_PT: f32 = 0.5;

/// One sheet of the output.
#[derive(Debug, Clone)]
pub struct PrintPage {
    pub width_mm: f64,
    pub height_mm: f64,
    /// Top-left corner of the image, mm from the top-left of the sheet.
    pub origin_mm: (f64, f64),
    pub image: RasterImage,
    /// Printed size of the image.
    pub image_size_mm: (f64, f64),
    pub ticks: Vec<Tick>,
}

/// A finished, print-ready document.
#[derive(Debug, Clone)]
pub struct PrintDocument {
    title: String,
    pixels_per_mm: f64,
    pages: Vec<PrintPage>,
}

// -- Assembly -----------------------------------------------------------------

/// Lay out one page per tile, in tile order.
#[instrument(skip_all, fields(tiles = tiles.len(), orientation = ?plan.orientation))]
pub fn assemble_tiled(image: &RasterImage, plan: &LayoutPlan, tiles: &[Tile]) -> Result<PrintDocument> {
    if (image.width(), image.height()) != (plan.image_width_px, plan.image_height_px) {
        return Err(MapmakerError::InvalidLayout(format!(
            "plan is for a {}x{} image, got {}x{}",
            plan.image_width_px,
            plan.image_height_px,
            image.width(),
            image.height()
        )));
    }
    if tiles.is_empty() {
        return Err(MapmakerError::InvalidLayout("no tiles to assemble".to_string()));
    }

    let (width_mm, height_mm) = plan.page_size_mm();
    let origin_mm = (plan.border.west, plan.border.north);

    let pages: Vec<PrintPage> = tiles
        .iter()
        .map(|tile| {
            let cropped = image.crop(tile.rect);
            let image_size_mm = (
                f64::from(cropped.width()) / plan.pixels_per_mm,
                f64::from(cropped.height()) / plan.pixels_per_mm,
            );
            debug!(
                page_x = tile.page_x,
                page_y = tile.page_y,
                width_px = cropped.width(),
                height_px = cropped.height(),
                "Placed tile"
            );
            PrintPage {
                width_mm,
                height_mm,
                origin_mm,
                image: cropped,
                image_size_mm,
                ticks: tile_marks(plan, tile),
            }
        })
        .collect();

    info!(pages = pages.len(), paper = %plan.paper, "Assembled tiled document");
    Ok(PrintDocument {
        title: format!("Map, {} x {} {}", plan.pages_horizontal, plan.pages_vertical, plan.paper),
        pixels_per_mm: plan.pixels_per_mm,
        pages,
    })
}

/// Put the whole image on one sheet sized to fit it plus `border`.
#[instrument(skip_all, fields(width_px = image.width(), height_px = image.height()))]
pub fn assemble_single(image: &RasterImage, grid: &GridSpec, border: &BorderSpec) -> Result<PrintDocument> {
    if image.width() == 0 || image.height() == 0 {
        return Err(MapmakerError::InvalidLayout("image has no pixels".to_string()));
    }
    for value in [border.north, border.east, border.south, border.west] {
        if !value.is_finite() || value < 0.0 {
            return Err(MapmakerError::InvalidLayout(format!(
                "borders must be non-negative, got {}",
                value
            )));
        }
    }

    let ppm = pixels_per_mm(image.width(), image.height(), grid);
    let image_size_mm = (
        f64::from(image.width()) / ppm,
        f64::from(image.height()) / ppm,
    );
    let page = PrintPage {
        width_mm: image_size_mm.0 + border.horizontal(),
        height_mm: image_size_mm.1 + border.vertical(),
        origin_mm: (border.west, border.north),
        image: image.clone(),
        image_size_mm,
        ticks: Vec::new(),
    };

    info!(
        width_mm = page.width_mm,
        height_mm = page.height_mm,
        "Assembled single-sheet document"
    );
    Ok(PrintDocument {
        title: format!("Map, {} x {} squares", grid.squares_wide, grid.squares_high),
        pixels_per_mm: ppm,
        pages: vec![page],
    })
}

impl PrintDocument {
    // -- Inspection -----------------------------------------------------------

    pub fn pages(&self) -> &[PrintPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pixels_per_mm(&self) -> f64 {
        self.pixels_per_mm
    }

    // -- Output ---------------------------------------------------------------

    /// Render every page to a PDF.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(MapmakerError::PdfError("document has no pages".to_string()));
        }

        // Placing at this DPI prints one pixel per 1/ppm mm with no extra scale.
        let dpi = (self.pixels_per_mm * MM_PER_INCH) as f32;
        let mut doc = PdfDocument::new(&self.title);

        let pages: Vec<PdfPage> = self
            .pages
            .iter()
            .map(|page| {
                let raw = RawImage {
                    pixels: RawImageData::U8(page.image.as_bytes().to_vec()),
                    width: page.image.width() as usize,
                    height: page.image.height() as usize,
                    data_format: match page.image.format() {
                        PixelFormat::Rgb => RawImageFormat::RGB8,
                        PixelFormat::Rgba => RawImageFormat::RGBA8,
                    },
                    tag: Vec::new(),
                };
                let xobject_id = doc.add_image(&raw);

                let (left, top) = page.origin_mm;
                let bottom = page.height_mm - top - page.image_size_mm.1;
                let mut ops = vec![Op::UseXobject {
                    id: xobject_id,
                    transform: XObjectTransform {
                        translate_x: Some(Mm(left as f32).into_pt()),
                        translate_y: Some(Mm(bottom as f32).into_pt()),
                        scale_x: None,
                        scale_y: None,
                        dpi: Some(dpi),
                        rotate: None,
                    },
                }];
                ops.extend(tick_ops(&page.ticks, page.height_mm));

                PdfPage::new(Mm(page.width_mm as f32), Mm(page.height_mm as f32), ops)
            })
            .collect();

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        debug!(bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    /// Render and write the PDF to `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_pdf_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            title = %self.title,
            "Wrote {} page PDF to {}",
            self.pages.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Drawing operations for `ticks`; solid strokes first, then dashed ones
/// inside their own graphics state.
fn tick_ops(ticks: &[Tick], page_height_mm: f64) -> Vec<Op> {
    if ticks.is_empty() {
        return Vec::new();
    }

    let stroke = |tick: &Tick| Op::DrawLine {
        line: Line {
            points: [tick.from, tick.to]
                .into_iter()
                .map(|(x, y)| LinePoint {
                    // Flip to PDF's bottom-left origin.
                    p: Point {
                        x: Mm(x as f32).into_pt(),
                        y: Mm((page_height_mm - y) as f32).into_pt(),
                    },
                    bezier: false,
                })
                .collect(),
            is_closed: false,
        },
    };

    let mut ops = vec![Op::SetOutlineThickness {
        pt: Pt(TICK_THICKNESS_PT),
    }];
    ops.extend(
        ticks
            .iter()
            .filter(|tick| tick.style == TickStyle::Solid)
            .map(stroke),
    );

    let dashed: Vec<Op> = ticks
        .iter()
        .filter(|tick| tick.style == TickStyle::Dashed)
        .map(stroke)
        .collect();
    if !dashed.is_empty() {
        ops.push(Op::SaveGraphicsState);
        ops.push(Op::SetLineDashPattern {
            dash: LineDashPattern {
                dash_1: Some(2),
                gap_1: Some(2),
                ..Default::default()
            },
        });
        ops.extend(dashed);
        ops.push(Op::RestoreGraphicsState);
    }
    ops
}
