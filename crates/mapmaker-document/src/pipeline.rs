// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline façade — one configured entry point for both jobs the tool does:
// pulling maps out of a PDF, and rendering a map image into a printable PDF.

use std::path::Path;

use mapmaker_core::MapConfig;
use mapmaker_core::error::Result;
use mapmaker_core::types::{GridSpec, OutputMode};
use tracing::{info, instrument};

use crate::image::{Enhancer, RasterImage, enhance_or_passthrough};
use crate::layout::plan;
use crate::pdf::{PrintDocument, SourceDocument, assemble_single, assemble_tiled};

/// Extraction and rendering driven by a [`MapConfig`].
pub struct MapPipeline {
    config: MapConfig,
    enhancer: Option<Box<dyn Enhancer>>,
}

impl MapPipeline {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            enhancer: None,
        }
    }

    /// Run `enhancer` on every image before it is laid out.
    pub fn with_enhancer(mut self, enhancer: Box<dyn Enhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    // -- Extraction -----------------------------------------------------------

    /// Every embedded image on the configured pages of the PDF at `path`
    /// that passes the configured size filter.
    ///
    /// A resource cycle in the document fails the whole call.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn extract_images(&self, path: impl AsRef<Path>) -> Result<Vec<RasterImage>> {
        let source = SourceDocument::open(path)?;
        let images = source
            .embedded_images(self.config.pages, self.config.extraction)
            .collect::<Result<Vec<_>>>()?;
        info!(count = images.len(), "Extraction complete");
        Ok(images)
    }

    // -- Rendering ------------------------------------------------------------

    /// Enhance `image` if an enhancer is set, then lay it out for printing
    /// in the configured mode.
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), mode = ?self.config.mode))]
    pub fn render(&self, image: RasterImage, grid: &GridSpec) -> Result<PrintDocument> {
        let image = enhance_or_passthrough(self.enhancer.as_deref(), image);

        match self.config.mode {
            OutputMode::Tiled => {
                let layout = plan(
                    image.width(),
                    image.height(),
                    grid,
                    self.config.paper_size()?,
                    &self.config.border,
                    &self.config.overlap,
                )?;
                assemble_tiled(&image, &layout, &layout.tiles())
            }
            OutputMode::Single => assemble_single(&image, grid, &self.config.border),
        }
    }

    /// [`MapPipeline::render`] straight to a PDF file. Nothing is written if
    /// layout fails.
    pub fn render_to_file(&self, image: RasterImage, grid: &GridSpec, path: impl AsRef<Path>) -> Result<PrintDocument> {
        let document = self.render(image, grid)?;
        document.write_to_file(path)?;
        Ok(document)
    }
}
