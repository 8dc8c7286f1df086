// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lossy PDF compression by rasterization: every page is rendered at its
// intrinsic size, re-encoded as JPEG, and placed on a page of the same size.
// Text and vector content do not survive.

use std::sync::Arc;

use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::Quality;
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::pdf::PdfWriter;
use crate::render::Rasterizer;

/// Rasterize `pdf` page by page into a JPEG-only PDF at `quality`.
#[instrument(skip(pdf), fields(bytes_len = pdf.len(), quality = quality.jpeg_quality()))]
pub fn compress_pdf(pdf: Arc<Vec<u8>>, quality: Quality) -> Result<Vec<u8>> {
    let rasterizer = Rasterizer::from_bytes(pdf)?;
    let total = rasterizer.page_count();
    if total == 0 {
        return Err(PdfwerkError::InputValidation("the document has no pages".into()));
    }
    info!(pages = total, "Compressing PDF");

    let mut writer = PdfWriter::new();
    for page_number in 1..=total {
        let page_size = rasterizer.page_size(page_number)?;
        let rendered = rasterizer.render(page_number, 1.0)?;
        let pixel_size = (rendered.width(), rendered.height());
        let jpeg = ImageProcessor::from_rgba(rendered.image).to_jpeg_bytes(quality)?;
        debug!(page_number, jpeg_bytes = jpeg.len(), "Page re-encoded");
        writer.add_jpeg_page(jpeg, pixel_size, page_size)?;
    }

    let output = writer.finish()?;
    info!(output_bytes = output.len(), "Compression complete");
    Ok(output)
}
