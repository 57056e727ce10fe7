// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source document — opens scenario PDFs with `lopdf` and hands out the
// embedded-image walk over a page range.

use std::path::Path;

use lopdf::{Document, ObjectId};
use mapmaker_core::config::ExtractionFilter;
use mapmaker_core::error::{MapmakerError, Result};
use mapmaker_core::types::PageRange;
use tracing::{debug, info, instrument};

use crate::extract::EmbeddedImages;

/// A PDF opened for image extraction. Never modified.
pub struct SourceDocument {
    /// The underlying lopdf document, decrypted if it was encrypted.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl SourceDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            MapmakerError::DocumentOpen(format!("{}: {}", path_ref.display(), err))
        })?;

        let mut source = Self::from_document(document)?;
        source.source_path = Some(path_ref.display().to_string());
        Ok(source)
    }

    /// Open a PDF already held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| MapmakerError::DocumentOpen(format!("in-memory PDF: {}", err)))?;
        Self::from_document(document)
    }

    /// Wrap an already parsed document, decrypting it if needed.
    pub fn from_document(mut document: Document) -> Result<Self> {
        unlock(&mut document)?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Page numbers (1-based) and object ids of the pages inside `range`.
    pub fn pages_in(&self, range: PageRange) -> Vec<(u32, ObjectId)> {
        let pages = self.document.get_pages();
        let Some((first, last)) = range.resolve(pages.len() as u32) else {
            return Vec::new();
        };
        pages.range(first..=last).map(|(n, id)| (*n, *id)).collect()
    }

    // -- Extraction -----------------------------------------------------------

    /// Lazily walk every embedded raster image on the pages in `range`.
    pub fn embedded_images(&self, range: PageRange, filter: ExtractionFilter) -> EmbeddedImages<'_> {
        let pages = self.pages_in(range);
        info!(
            source = self.source_path.as_deref().unwrap_or("in-memory PDF"),
            pages = pages.len(),
            min_width = filter.min_width,
            min_height = filter.min_height,
            "Scanning for embedded images"
        );
        EmbeddedImages::new(&self.document, pages, filter)
    }
}

/// Make sure an encrypted document is readable.
///
/// lopdf decrypts while loading when the empty user password opens the file,
/// recording that in `encryption_state` and leaving `/Encrypt` in place. A
/// second decryption pass would scramble every stream, so one is only tried
/// when loading could not authenticate.
fn unlock(document: &mut Document) -> Result<()> {
    if !document.is_encrypted() {
        return Ok(());
    }
    if document.encryption_state.is_some() {
        debug!("Document was decrypted on load with the empty user password");
        return Ok(());
    }

    info!("Document is encrypted, trying the empty user password");
    document
        .decrypt("")
        .map_err(|err| MapmakerError::Decryption(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, dictionary};

    /// Build an `n` page document with no content.
    fn blank_pdf(n: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..n)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => n as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn garbage_is_a_document_open_error() {
        let err = SourceDocument::from_bytes(b"not a pdf at all").err().unwrap();
        assert!(matches!(err, MapmakerError::DocumentOpen(_)));
    }

    #[test]
    fn missing_file_is_a_document_open_error() {
        let err = SourceDocument::open("/definitely/not/here.pdf").err().unwrap();
        assert!(matches!(err, MapmakerError::DocumentOpen(_)));
    }

    #[test]
    fn page_range_selects_inclusive_pages() {
        let source = SourceDocument::from_bytes(&blank_pdf(5)).unwrap();
        assert_eq!(source.page_count(), 5);

        let numbers: Vec<u32> = source
            .pages_in(PageRange {
                first: Some(2),
                last: Some(4),
            })
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(numbers, vec![2, 3, 4]);

        assert_eq!(source.pages_in(PageRange::single(5)).len(), 1);
        assert!(source.pages_in(PageRange::single(9)).is_empty());
    }

    #[test]
    fn pages_without_images_yield_nothing() {
        let source = SourceDocument::from_bytes(&blank_pdf(3)).unwrap();
        let found = source
            .embedded_images(PageRange::all(), ExtractionFilter::default())
            .count();
        assert_eq!(found, 0);
    }
}
