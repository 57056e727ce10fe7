// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding of image XObject streams. Two storage encodings are understood:
// raw bitmaps (uncompressed or Flate) that need /Width and /Height to make
// sense of, and DCT streams that are complete JPEG files on their own.

use std::borrow::Cow;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use mapmaker_core::error::{MapmakerError, Result};
use tracing::debug;

/// How to read the samples of a raw bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// Three interleaved 8-bit samples per pixel.
    Rgb,
    /// One 8-bit sample per pixel; soft masks are always read this way.
    Luma,
}

impl Channels {
    fn count(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Luma => 1,
        }
    }
}

/// The pixel payload of an image XObject, tagged by its storage encoding.
#[derive(Debug, Clone)]
pub enum EncodedImage<'a> {
    /// Plain samples, already inflated if the stream was Flate-compressed.
    RawBitmap {
        width: u32,
        height: u32,
        bytes: Cow<'a, [u8]>,
    },
    /// A JPEG file.
    DctCompressed { bytes: &'a [u8] },
}

/// The declared `/Filter` of a stream.
#[derive(Debug, PartialEq, Eq)]
enum Encoding {
    Uncompressed,
    Flate,
    Dct,
    Unsupported(String),
}

fn encoding_of(dict: &Dictionary) -> Encoding {
    let name = match dict.get(b"Filter") {
        Err(_) => return Encoding::Uncompressed,
        Ok(Object::Name(name)) => name.as_slice(),
        // A chain of one filter is the same as that filter.
        Ok(Object::Array(filters)) if filters.len() == 1 => match &filters[0] {
            Object::Name(name) => name.as_slice(),
            other => return Encoding::Unsupported(format!("{:?}", other)),
        },
        Ok(other) => return Encoding::Unsupported(format!("{:?}", other)),
    };

    match name {
        b"FlateDecode" => Encoding::Flate,
        b"DCTDecode" => Encoding::Dct,
        other => Encoding::Unsupported(String::from_utf8_lossy(other).into_owned()),
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let label = String::from_utf8_lossy(key);
    let value = dict
        .get(key)
        .and_then(Object::as_i64)
        .map_err(|err| MapmakerError::ImageError(format!("missing /{}: {}", label, err)))?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| MapmakerError::ImageError(format!("/{} of {} is not usable", label, value)))
}

impl<'a> EncodedImage<'a> {
    /// Classify an image stream by its filter.
    ///
    /// Returns `Ok(None)` for encodings this crate does not handle (JPX,
    /// CCITT, filter chains, ...).
    pub fn from_stream(stream: &'a Stream) -> Result<Option<Self>> {
        let dict = &stream.dict;
        let bytes = match encoding_of(dict) {
            Encoding::Dct => {
                return Ok(Some(Self::DctCompressed {
                    bytes: &stream.content,
                }));
            }
            Encoding::Unsupported(filter) => {
                debug!(filter, "Unsupported image encoding");
                return Ok(None);
            }
            Encoding::Uncompressed => Cow::Borrowed(stream.content.as_slice()),
            Encoding::Flate => Cow::Owned(stream.decompressed_content().map_err(|err| {
                MapmakerError::ImageError(format!("cannot inflate image stream: {}", err))
            })?),
        };

        if let Ok(bits) = dict.get(b"BitsPerComponent").and_then(Object::as_i64)
            && bits != 8
        {
            return Err(MapmakerError::ImageError(format!(
                "{} bits per component is not supported",
                bits
            )));
        }

        Ok(Some(Self::RawBitmap {
            width: dimension(dict, b"Width")?,
            height: dimension(dict, b"Height")?,
            bytes,
        }))
    }

    /// Decode to pixels.
    ///
    /// Raw bitmaps are read with the requested channel layout. DCT images
    /// come back in whatever layout the JPEG holds, except that
    /// [`Channels::Luma`] always yields a single channel.
    pub fn decode(&self, channels: Channels) -> Result<DynamicImage> {
        match self {
            Self::RawBitmap {
                width,
                height,
                bytes,
            } => {
                let needed = (*width as usize)
                    .checked_mul(*height as usize)
                    .and_then(|pixels| pixels.checked_mul(channels.count()))
                    .ok_or_else(|| {
                        MapmakerError::ImageError(format!("{}x{} bitmap is too large", width, height))
                    })?;
                if bytes.len() < needed {
                    return Err(MapmakerError::ImageError(format!(
                        "{}x{} {:?} bitmap needs {} bytes, stream holds {}",
                        width,
                        height,
                        channels,
                        needed,
                        bytes.len()
                    )));
                }

                let samples = bytes[..needed].to_vec();
                let image = match channels {
                    Channels::Rgb => {
                        RgbImage::from_raw(*width, *height, samples).map(DynamicImage::ImageRgb8)
                    }
                    Channels::Luma => {
                        GrayImage::from_raw(*width, *height, samples).map(DynamicImage::ImageLuma8)
                    }
                };
                image.ok_or_else(|| {
                    MapmakerError::ImageError(format!("{}x{} bitmap has a bad buffer", width, height))
                })
            }
            Self::DctCompressed { bytes } => {
                let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
                    .map_err(|err| MapmakerError::ImageError(format!("JPEG decode failed: {}", err)))?;
                Ok(match channels {
                    Channels::Rgb => image,
                    Channels::Luma => DynamicImage::ImageLuma8(image.to_luma8()),
                })
            }
        }
    }
}

/// Decode the soft mask an image dictionary points at through `/SMask`.
///
/// Returns `Ok(None)` when there is no mask.
pub fn decode_soft_mask(document: &Document, image_dict: &Dictionary) -> Result<Option<GrayImage>> {
    let Ok(mask) = image_dict.get(b"SMask") else {
        return Ok(None);
    };

    let stream = match mask {
        Object::Reference(id) => document.get_object(*id),
        other => Ok(other),
    }
    .and_then(Object::as_stream)
    .map_err(|err| MapmakerError::ImageError(format!("unreadable /SMask: {}", err)))?;

    let encoded = EncodedImage::from_stream(stream)?.ok_or_else(|| {
        MapmakerError::ImageError("/SMask uses an unsupported encoding".to_string())
    })?;

    Ok(Some(encoded.decode(Channels::Luma)?.into_luma8()))
}
