// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resource-graph walker — finds image XObjects on each page, descending into
// transparency-group forms, and yields them as RGB(A) rasters.
//
// The walk uses an explicit stack rather than recursion. Each pending entry
// remembers which groups it was reached through, so a group that contains
// itself is reported instead of looping forever.

use std::rc::Rc;

use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use mapmaker_core::config::ExtractionFilter;
use mapmaker_core::error::{MapmakerError, Result};
use tracing::{debug, info, warn};

use super::decode::{Channels, EncodedImage, decode_soft_mask};
use crate::image::RasterImage;

/// How far up the page tree to look for inherited `/Resources`.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// An XObject waiting to be visited.
struct Pending<'a> {
    page: u32,
    name: String,
    object: &'a Object,
    /// Groups this entry was reached through, outermost first.
    ancestry: Rc<Vec<ObjectId>>,
}

/// Lazy iterator over the embedded images of a run of pages.
///
/// Images come out in document order: page by page, and within a page in
/// `/XObject` dictionary order with the contents of a group emitted where
/// the group itself appears. Images that fail to decode are logged and
/// skipped. A group cycle yields one `Err(MalformedDocument)` and the walk
/// continues with the remaining entries.
pub struct EmbeddedImages<'a> {
    document: &'a Document,
    pages: std::vec::IntoIter<(u32, ObjectId)>,
    pending: Vec<Pending<'a>>,
    filter: ExtractionFilter,
    emitted: usize,
}

impl<'a> EmbeddedImages<'a> {
    pub(crate) fn new(
        document: &'a Document,
        pages: Vec<(u32, ObjectId)>,
        filter: ExtractionFilter,
    ) -> Self {
        Self {
            document,
            pages: pages.into_iter(),
            pending: Vec::new(),
            filter,
            emitted: 0,
        }
    }

    /// Resolve a reference one level, returning the target and its id.
    fn resolve(&self, object: &'a Object) -> std::result::Result<(Option<ObjectId>, &'a Object), lopdf::Error> {
        match object {
            Object::Reference(id) => self.document.get_object(*id).map(|target| (Some(*id), target)),
            other => Ok((None, other)),
        }
    }

    fn resolve_dict(&self, object: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(object).ok().and_then(|(_, target)| target.as_dict().ok())
    }

    /// `/Resources` of a page, inherited from its ancestors if it has none.
    fn page_resources(&self, page_id: ObjectId) -> Option<&'a Dictionary> {
        let mut node = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            if let Ok(resources) = node.get(b"Resources") {
                return self.resolve_dict(resources);
            }
            node = self.resolve_dict(node.get(b"Parent").ok()?)?;
        }
        None
    }

    /// Push the `/XObject` entries of `resources` so they pop in dictionary
    /// order.
    fn queue(&mut self, page: u32, resources: &'a Dictionary, ancestry: Rc<Vec<ObjectId>>) {
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|xobjects| self.resolve_dict(xobjects))
        else {
            return;
        };

        let entries: Vec<_> = xobjects.iter().collect();
        for (name, object) in entries.into_iter().rev() {
            self.pending.push(Pending {
                page,
                name: String::from_utf8_lossy(name).into_owned(),
                object,
                ancestry: Rc::clone(&ancestry),
            });
        }
    }

    /// Visit one XObject. Returns `Some` when it produced something to
    /// yield.
    fn visit(&mut self, entry: Pending<'a>) -> Option<Result<RasterImage>> {
        let (id, object) = match self.resolve(entry.object) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(page = entry.page, name = %entry.name, %err, "Unresolvable XObject, skipping");
                return None;
            }
        };
        let Ok(stream) = object.as_stream() else {
            debug!(page = entry.page, name = %entry.name, "XObject is not a stream, skipping");
            return None;
        };
        let dict = &stream.dict;

        let is_image = dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .is_ok_and(|subtype| subtype == b"Image");

        if is_image {
            return self.extract(&entry, stream).map(Ok);
        }

        if dict.has(b"Resources") && dict.has(b"Group") {
            if let Some(id) = id
                && entry.ancestry.contains(&id)
            {
                return Some(Err(MapmakerError::MalformedDocument(format!(
                    "group {:?} ('{}' on page {}) contains itself",
                    id, entry.name, entry.page
                ))));
            }

            let Some(resources) = self.resolve_dict_entry(dict, b"Resources") else {
                return None;
            };
            let mut ancestry = entry.ancestry.as_ref().clone();
            ancestry.extend(id);
            debug!(page = entry.page, name = %entry.name, depth = ancestry.len(), "Descending into group");
            self.queue(entry.page, resources, Rc::new(ancestry));
        }

        None
    }

    fn resolve_dict_entry(&self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
        dict.get(key).ok().and_then(|value| self.resolve_dict(value))
    }

    /// Decode an image XObject, apply its soft mask and the size filter.
    fn extract(&self, entry: &Pending<'a>, stream: &'a Stream) -> Option<RasterImage> {
        let decoded = EncodedImage::from_stream(stream).and_then(|encoded| match encoded {
            Some(encoded) => encoded.decode(Channels::Rgb).map(Some),
            None => Ok(None),
        });

        let base = match decoded {
            Ok(Some(DynamicImage::ImageRgb8(rgb))) => rgb,
            Ok(Some(other)) => {
                debug!(page = entry.page, name = %entry.name, color = ?other.color(), "Not an RGB image, skipping");
                return None;
            }
            Ok(None) => return None,
            Err(err) => {
                warn!(page = entry.page, name = %entry.name, %err, "Cannot decode image, skipping");
                return None;
            }
        };

        if !self
            .filter
            .accepts(base.width(), base.height(), stream.content.len())
        {
            debug!(
                page = entry.page,
                name = %entry.name,
                width = base.width(),
                height = base.height(),
                bytes = stream.content.len(),
                "Image below size thresholds, skipping"
            );
            return None;
        }

        let image = match decode_soft_mask(self.document, &stream.dict) {
            Ok(None) => RasterImage::from_rgb(base),
            Ok(Some(mask)) => match RasterImage::with_alpha_mask(&base, &mask) {
                Some(masked) => masked,
                None => {
                    warn!(
                        page = entry.page,
                        name = %entry.name,
                        image = ?base.dimensions(),
                        mask = ?mask.dimensions(),
                        "Soft mask size differs from image, keeping image opaque"
                    );
                    RasterImage::from_rgb(base)
                }
            },
            Err(err) => {
                warn!(page = entry.page, name = %entry.name, %err, "Cannot decode soft mask, keeping image opaque");
                RasterImage::from_rgb(base)
            }
        };

        info!(
            page = entry.page,
            name = %entry.name,
            width = image.width(),
            height = image.height(),
            format = ?image.format(),
            "Extracted image"
        );
        Some(image)
    }
}

impl Iterator for EmbeddedImages<'_> {
    type Item = Result<RasterImage>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(entry) = self.pending.pop() else {
                let (page, page_id) = self.pages.next()?;
                match self.page_resources(page_id) {
                    Some(resources) => self.queue(page, resources, Rc::new(Vec::new())),
                    None => debug!(page, "Page has no resources"),
                }
                continue;
            };

            if let Some(item) = self.visit(entry) {
                if item.is_ok() {
                    self.emitted += 1;
                }
                return Some(item);
            }
        }
    }
}

impl Drop for EmbeddedImages<'_> {
    fn drop(&mut self) {
        debug!(emitted = self.emitted, "Image scan finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;
    use crate::pdf::SourceDocument;
    use image::{ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};
    use lopdf::{EncryptionState, EncryptionVersion, Permissions, Stream, dictionary};
    use mapmaker_core::types::PageRange;

    /// Minimal in-memory PDF builder for walker tests.
    struct Builder {
        doc: Document,
        pages_id: ObjectId,
        kids: Vec<Object>,
    }

    impl Builder {
        fn new() -> Self {
            let mut doc = Document::with_version("1.5");
            let pages_id = doc.new_object_id();
            Self {
                doc,
                pages_id,
                kids: Vec::new(),
            }
        }

        fn jpeg(&mut self, width: u32, height: u32) -> ObjectId {
            let pixels = RgbImage::from_pixel(width, height, image::Rgb([180, 90, 30]));
            let mut bytes = Vec::new();
            JpegEncoder::new_with_quality(&mut bytes, 85)
                .write_image(pixels.as_raw(), width, height, image::ExtendedColorType::Rgb8)
                .unwrap();
            self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                bytes,
            ))
        }

        fn raw(&mut self, width: u32, height: u32, channels: usize, fill: u8) -> Stream {
            let mut stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => if channels == 1 { "DeviceGray" } else { "DeviceRGB" },
                    "BitsPerComponent" => 8,
                },
                vec![fill; width as usize * height as usize * channels],
            );
            stream.compress().unwrap();
            stream
        }

        fn flate(&mut self, width: u32, height: u32) -> ObjectId {
            let stream = self.raw(width, height, 3, 120);
            self.doc.add_object(stream)
        }

        fn flate_with_mask(&mut self, width: u32, height: u32, mask: (u32, u32)) -> ObjectId {
            let mask_stream = self.raw(mask.0, mask.1, 1, 77);
            let mask_id = self.doc.add_object(mask_stream);
            let mut stream = self.raw(width, height, 3, 120);
            stream.dict.set("SMask", mask_id);
            self.doc.add_object(stream)
        }

        fn group(&mut self, entries: Vec<(&str, ObjectId)>) -> ObjectId {
            let id = self.doc.new_object_id();
            self.fill_group(id, entries);
            id
        }

        fn fill_group(&mut self, id: ObjectId, entries: Vec<(&str, ObjectId)>) {
            let mut xobjects = Dictionary::new();
            for (name, target) in entries {
                xobjects.set(name, target);
            }
            let form = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                    "Group" => dictionary! { "S" => "Transparency" },
                    "Resources" => dictionary! { "XObject" => xobjects },
                },
                Vec::new(),
            );
            self.doc.objects.insert(id, Object::Stream(form));
        }

        fn page(&mut self, entries: Vec<(&str, ObjectId)>) {
            let mut xobjects = Dictionary::new();
            for (name, target) in entries {
                xobjects.set(name, target);
            }
            let resources_id = self.doc.add_object(dictionary! { "XObject" => xobjects });
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            self.kids.push(page_id.into());
        }

        fn build(self) -> SourceDocument {
            let mut bytes = Vec::new();
            self.finish().save_to(&mut bytes).unwrap();
            SourceDocument::from_bytes(&bytes).unwrap()
        }

        /// Encrypt with 128-bit RC4, owner password only.
        fn build_encrypted(self) -> SourceDocument {
            let mut doc = self.finish();
            let file_id = Object::string_literal(b"mapmaker-fixture".to_vec());
            doc.trailer.set("ID", Object::Array(vec![file_id.clone(), file_id]));
            let version = EncryptionVersion::V2 {
                document: &doc,
                owner_password: "owner",
                user_password: "",
                key_length: 128,
                permissions: Permissions::all(),
            };
            let state = EncryptionState::try_from(version).unwrap();
            doc.encrypt(&state).unwrap();

            let mut bytes = Vec::new();
            doc.save_to(&mut bytes).unwrap();
            SourceDocument::from_bytes(&bytes).unwrap()
        }

        fn finish(mut self) -> Document {
            let count = self.kids.len() as i64;
            self.doc.objects.insert(
                self.pages_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Pages",
                    "Kids" => self.kids,
                    "Count" => count,
                }),
            );
            let catalog_id = self.doc.add_object(dictionary! {
                "Type" => "Catalog",
                "Pages" => self.pages_id,
            });
            self.doc.trailer.set("Root", catalog_id);
            self.doc
        }
    }

    fn collect(source: &SourceDocument, filter: ExtractionFilter) -> Vec<RasterImage> {
        source
            .embedded_images(PageRange::all(), filter)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn jpeg_and_masked_bitmap_come_out_in_order() {
        let mut b = Builder::new();
        let jpeg = b.jpeg(500, 500);
        let masked = b.flate_with_mask(300, 300, (300, 300));
        b.page(vec![("Im0", jpeg), ("Im1", masked)]);
        let source = b.build();

        let images = collect(&source, ExtractionFilter::default());
        assert_eq!(images.len(), 2);

        assert_eq!((images[0].width(), images[0].height()), (500, 500));
        assert_eq!(images[0].format(), PixelFormat::Rgb);

        assert_eq!((images[1].width(), images[1].height()), (300, 300));
        assert_eq!(images[1].format(), PixelFormat::Rgba);
        let rgba = images[1].as_dynamic().to_rgba8();
        assert!(rgba.pixels().all(|p| p.0 == [120, 120, 120, 77]));
    }

    #[test]
    fn uncompressed_bitmap_is_extracted() {
        let mut b = Builder::new();
        let plain = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 150,
                "Height" => 120,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![64; 150 * 120 * 3],
        );
        let id = b.doc.add_object(plain);
        b.page(vec![("Im0", id)]);
        let source = b.build();

        let images = collect(&source, ExtractionFilter::default());
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width(), images[0].height()), (150, 120));
        assert!(images[0].as_bytes().iter().all(|&v| v == 64));
    }

    #[test]
    fn owner_locked_document_is_read_transparently() {
        let mut b = Builder::new();
        let masked = b.flate_with_mask(200, 200, (200, 200));
        b.page(vec![("Im0", masked)]);
        let source = b.build_encrypted();

        let images = collect(&source, ExtractionFilter::default());
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width(), images[0].height()), (200, 200));
        let rgba = images[0].as_dynamic().to_rgba8();
        assert!(rgba.pixels().all(|p| p.0 == [120, 120, 120, 77]));
    }

    #[test]
    fn mismatched_mask_leaves_image_opaque() {
        let mut b = Builder::new();
        let masked = b.flate_with_mask(300, 300, (150, 150));
        b.page(vec![("Im0", masked)]);
        let source = b.build();

        let images = collect(&source, ExtractionFilter::default());
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].format(), PixelFormat::Rgb);
    }

    #[test]
    fn size_threshold_is_inclusive() {
        let mut b = Builder::new();
        let exact = b.flate(100, 100);
        let narrow = b.flate(99, 400);
        let short = b.flate(400, 99);
        b.page(vec![("A", exact), ("B", narrow), ("C", short)]);
        let source = b.build();

        let images = collect(&source, ExtractionFilter::default());
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width(), images[0].height()), (100, 100));
    }

    #[test]
    fn byte_size_filter_uses_encoded_length() {
        let mut b = Builder::new();
        let tiny = b.flate(200, 200);
        b.page(vec![("Im0", tiny)]);
        let source = b.build();

        let strict = ExtractionFilter {
            min_bytes: 1024 * 1024,
            ..ExtractionFilter::default()
        };
        assert!(collect(&source, strict).is_empty());
        assert_eq!(collect(&source, ExtractionFilter::default()).len(), 1);
    }

    #[test]
    fn nested_groups_are_walked_in_place() {
        let mut b = Builder::new();
        let first = b.flate(101, 100);
        let inner_image = b.flate(102, 100);
        let inner = b.group(vec![("Deep", inner_image)]);
        let outer_image = b.flate(103, 100);
        let outer = b.group(vec![("Inner", inner), ("Shallow", outer_image)]);
        let last = b.flate(104, 100);
        b.page(vec![("A", first), ("B", outer), ("C", last)]);
        let source = b.build();

        let widths: Vec<u32> = collect(&source, ExtractionFilter::default())
            .iter()
            .map(RasterImage::width)
            .collect();
        assert_eq!(widths, vec![101, 102, 103, 104]);
    }

    #[test]
    fn shared_group_is_not_a_cycle() {
        let mut b = Builder::new();
        let image = b.flate(120, 120);
        let shared = b.group(vec![("Im", image)]);
        b.page(vec![("G1", shared), ("G2", shared)]);
        let source = b.build();

        assert_eq!(collect(&source, ExtractionFilter::default()).len(), 2);
    }

    #[test]
    fn self_referencing_group_is_reported_and_skipped() {
        let mut b = Builder::new();
        let image = b.flate(120, 120);
        let looping = b.doc.new_object_id();
        b.fill_group(looping, vec![("Im", image), ("Again", looping)]);
        let after = b.flate(130, 130);
        b.page(vec![("Loop", looping), ("After", after)]);
        let source = b.build();

        let items: Vec<_> = source
            .embedded_images(PageRange::all(), ExtractionFilter::default())
            .collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().width(), 120);
        assert!(matches!(items[1], Err(MapmakerError::MalformedDocument(_))));
        assert_eq!(items[2].as_ref().unwrap().width(), 130);
    }

    #[test]
    fn broken_image_does_not_stop_the_scan() {
        let mut b = Builder::new();
        let broken = b.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 500,
                "Height" => 500,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            b"definitely not a jpeg".to_vec(),
        ));
        let good = b.flate(200, 200);
        b.page(vec![("Bad", broken)]);
        b.page(vec![("Good", good)]);
        let source = b.build();

        let images = collect(&source, ExtractionFilter::default());
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].width(), 200);
    }

    #[test]
    fn page_range_limits_the_scan() {
        let mut b = Builder::new();
        for width in [110, 120, 130] {
            let image = b.flate(width, 100);
            b.page(vec![("Im", image)]);
        }
        let source = b.build();

        let widths: Vec<u32> = source
            .embedded_images(PageRange::single(2), ExtractionFilter::default())
            .map(|image| image.unwrap().width())
            .collect();
        assert_eq!(widths, vec![120]);
    }
}
