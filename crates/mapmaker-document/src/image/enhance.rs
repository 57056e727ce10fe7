// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Best-effort image enhancement. An enhancer (typically an external
// super-resolution tool) is optional; when it is missing or fails the
// original image is used unchanged.

use mapmaker_core::error::Result;
use tracing::{debug, info, warn};

use super::raster::RasterImage;

/// A transformation applied to a map before it is laid out.
pub trait Enhancer {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Produce an enhanced copy of `image`.
    fn enhance(&self, image: &RasterImage) -> Result<RasterImage>;
}

/// Run `enhancer` over `image` if one is configured.
///
/// Failure is never fatal: the error is logged and the input is returned.
pub fn enhance_or_passthrough(enhancer: Option<&dyn Enhancer>, image: RasterImage) -> RasterImage {
    let Some(enhancer) = enhancer else {
        debug!("No enhancer configured, using image as-is");
        return image;
    };

    match enhancer.enhance(&image) {
        Ok(enhanced) => {
            info!(
                enhancer = enhancer.name(),
                from_w = image.width(),
                from_h = image.height(),
                to_w = enhanced.width(),
                to_h = enhanced.height(),
                "Image enhanced"
            );
            enhanced
        }
        Err(err) => {
            warn!(enhancer = enhancer.name(), %err, "Enhancer failed, using original image");
            image
        }
    }
}
