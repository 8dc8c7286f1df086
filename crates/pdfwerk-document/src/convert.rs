// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF to image conversion.
//
// Selected pages are rendered one at a time, encoded, and written straight
// into a deflate-compressed ZIP archive, so at most one page image is held in
// memory alongside the growing archive.

use std::io::{Cursor, Write};
use std::sync::Arc;

use pdfwerk_core::config::ConvertSettings;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::{ImageFormat, PageSelection, Quality};
use tracing::{debug, info, instrument};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::image::ImageProcessor;
use crate::render::Rasterizer;

/// Default file name offered for the archive.
pub const DEFAULT_ARCHIVE_NAME: &str = "converted_pages.zip";

/// How pages are rendered and packed.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    pub format: ImageFormat,
    /// Multiple of the page's intrinsic size.
    pub scale: f32,
    /// Deflate level, 0–9.
    pub compression_level: i64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from(&ConvertSettings::default())
    }
}

impl From<&ConvertSettings> for ConvertOptions {
    fn from(settings: &ConvertSettings) -> Self {
        Self {
            format: settings.format,
            scale: settings.render_scale,
            compression_level: settings.compression_level,
        }
    }
}

/// A finished archive and the entry names it contains, in page order.
#[derive(Debug, Clone)]
pub struct ImageArchive {
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
}

/// Entry name for one page, e.g. `page_3.png`.
pub fn entry_name(page_number: u32, format: ImageFormat) -> String {
    format!("page_{}.{}", page_number, format.extension())
}

/// Render `selection` from `pdf` and pack the images into a ZIP archive.
///
/// An empty selection is rejected before the document is even parsed.
#[instrument(skip(pdf, options), fields(format = ?options.format, scale = options.scale))]
pub fn convert_to_images(
    pdf: Arc<Vec<u8>>,
    selection: &PageSelection,
    options: &ConvertOptions,
) -> Result<ImageArchive> {
    if selection.is_empty() {
        return Err(PdfwerkError::InputValidation(
            "select at least one page to convert".into(),
        ));
    }
    if !(0..=9).contains(&options.compression_level) {
        return Err(PdfwerkError::InputValidation(format!(
            "compression level must be between 0 and 9, got {}",
            options.compression_level
        )));
    }
    if !(options.scale.is_finite() && options.scale > 0.0) {
        return Err(PdfwerkError::InputValidation(format!(
            "render scale must be positive, got {}",
            options.scale
        )));
    }

    let rasterizer = Rasterizer::from_bytes(pdf)?;
    let pages = selection.resolve(rasterizer.page_count())?;
    info!(pages = pages.len(), "Converting pages to images");

    let zip_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(options.compression_level));
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(pages.len());
    // Quality is ignored by the lossless formats; JPEG pages are kept at
    // full quality here since the archive is already the user's export.
    let quality = Quality::from_factor(1.0)?;

    for page_number in pages {
        let rendered = rasterizer.render(page_number, options.scale)?;
        let encoded = ImageProcessor::from_rgba(rendered.image).encode(options.format, quality)?;

        let name = entry_name(page_number, options.format);
        zip.start_file(name.as_str(), zip_options)
            .map_err(|err| PdfwerkError::Export(format!("cannot add {}: {}", name, err)))?;
        zip.write_all(&encoded)
            .map_err(|err| PdfwerkError::Export(format!("cannot write {}: {}", name, err)))?;
        debug!(entry = %name, bytes = encoded.len(), "Page archived");
        entries.push(name);
    }

    let bytes = zip
        .finish()
        .map_err(|err| PdfwerkError::Export(format!("cannot finish archive: {}", err)))?
        .into_inner();

    info!(entries = entries.len(), archive_bytes = bytes.len(), "Archive ready");
    Ok(ImageArchive { bytes, entries })
}
