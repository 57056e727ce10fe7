// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster image — the pixel buffer that flows from extraction through layout
// to the printed document. Backed by the `image` crate.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use mapmaker_core::error::{MapmakerError, Result};
use tracing::{debug, info, instrument};

use crate::layout::PixelRect;

/// Channel layout of a [`RasterImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

/// An owned RGB or RGBA image.
///
/// Anything else handed to [`RasterImage::from_dynamic`] is converted, keeping
/// an alpha channel if the source had one.
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
}

impl RasterImage {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            MapmakerError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self::from_dynamic(img))
    }

    /// Wrap a decoded image, normalising it to 8-bit RGB or RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let image = match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
            other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
        Self { image }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    /// Combine an RGB base with a same-sized luma mask used as alpha.
    ///
    /// Returns `None` when the dimensions differ.
    pub fn with_alpha_mask(base: &RgbImage, mask: &GrayImage) -> Option<Self> {
        if base.dimensions() != mask.dimensions() {
            return None;
        }
        let rgba = RgbaImage::from_fn(base.width(), base.height(), |x, y| {
            let image::Rgb([r, g, b]) = *base.get_pixel(x, y);
            let image::Luma([a]) = *mask.get_pixel(x, y);
            image::Rgba([r, g, b, a])
        });
        Some(Self::from_rgba(rgba))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn format(&self) -> PixelFormat {
        if self.image.color().has_alpha() {
            PixelFormat::Rgba
        } else {
            PixelFormat::Rgb
        }
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Raw interleaved samples, 3 or 4 bytes per pixel depending on
    /// [`RasterImage::format`].
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    // -- Transformations ------------------------------------------------------

    /// Copy out a rectangle of this image.
    ///
    /// The rectangle is clamped to the image bounds, so a tile never reads
    /// past the source edge.
    pub fn crop(&self, rect: PixelRect) -> Self {
        let x = rect.x.min(self.width());
        let y = rect.y.min(self.height());
        let width = rect.width.min(self.width() - x);
        let height = rect.height.min(self.height() - y);
        debug!(x, y, width, height, "Cropping image");
        Self {
            image: self.image.crop_imm(x, y, width, height),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            MapmakerError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}
