// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — build image-only PDFs with `lopdf`.
//
// Each page holds one JPEG image XObject stretched over the full page. The
// JPEG bytes are embedded as-is with /DCTDecode, so nothing is re-encoded.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, instrument};

/// Name under which each page refers to its image.
const IMAGE_NAME: &[u8] = b"Im0";

/// Accumulates image pages and serialises them into a new PDF.
pub struct PdfWriter {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page of `page_size` points showing the baseline JPEG `jpeg`,
    /// whose pixel dimensions are `pixel_size`.
    #[instrument(skip(self, jpeg), fields(jpeg_bytes = jpeg.len()))]
    pub fn add_jpeg_page(
        &mut self,
        jpeg: Vec<u8>,
        pixel_size: (u32, u32),
        page_size: (f32, f32),
    ) -> Result<()> {
        let (pixel_w, pixel_h) = pixel_size;
        let (page_w, page_h) = page_size;
        if pixel_w == 0 || pixel_h == 0 {
            return Err(PdfwerkError::Export("image has no pixels".into()));
        }
        if !(page_w.is_finite() && page_h.is_finite() && page_w > 0.0 && page_h > 0.0) {
            return Err(PdfwerkError::Export(format!(
                "invalid page size {page_w}x{page_h}"
            )));
        }

        let mut image_dict = Dictionary::new();
        image_dict.set("Type", Object::Name(b"XObject".to_vec()));
        image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
        image_dict.set("Width", Object::Integer(pixel_w as i64));
        image_dict.set("Height", Object::Integer(pixel_h as i64));
        image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        image_dict.set("BitsPerComponent", Object::Integer(8));
        image_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        let image_id = self
            .document
            .add_object(Object::Stream(Stream::new(image_dict, jpeg)));

        // Unit square scaled to the page: draws the image edge to edge.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::from(page_w),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::from(page_h),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|err| {
            PdfwerkError::Export(format!("failed to encode page content: {}", err))
        })?;
        let content_id = self
            .document
            .add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

        let mut xobjects = Dictionary::new();
        xobjects.set(IMAGE_NAME.to_vec(), Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::from(page_w),
                Object::from(page_h),
            ]),
        );
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Reference(content_id));
        let page_id = self.document.add_object(Object::Dictionary(page));

        self.kids.push(Object::Reference(page_id));
        debug!(page = self.kids.len(), pixel_w, pixel_h, "Image page added");
        Ok(())
    }

    /// Close the page tree and serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(PdfwerkError::Export("no pages were added".into()));
        }

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(self.kids.len() as i64));
        pages.set("Kids", Object::Array(self.kids));
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.document.add_object(Object::Dictionary(catalog));
        self.document
            .trailer
            .set("Root", Object::Reference(catalog_id));

        // Streams that already carry a /Filter (the JPEGs) are left alone.
        self.document.compress();

        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            PdfwerkError::Export(format!("failed to serialise PDF: {}", err))
        })?;
        Ok(output)
    }
}
