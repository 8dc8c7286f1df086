// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterizer backed by `hayro`.
//
// A `Rasterizer` parses the document once and renders pages on demand onto a
// white background. Page numbers are 1-based throughout.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_interpret::util::PageExt;
use hayro::hayro_syntax::Pdf;
use hayro::vello_cpu::color::palette::css::WHITE;
use hayro::{RenderSettings, render};
use image::RgbaImage;
use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, instrument};

/// Longest side, in pixels, a rendered page may have.
pub const MAX_SIDE_PX: u32 = 16_384;

/// Largest pixel count a rendered page may have.
pub const MAX_PIXELS: u64 = 1 << 28;

/// One rendered page.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub page_number: u32,
    pub image: RgbaImage,
}

impl PageImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Parsed document ready for rendering.
pub struct Rasterizer {
    pdf: Pdf,
}

impl Rasterizer {
    /// Parse `bytes` for rendering. The buffer is shared, not copied.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_bytes(bytes: Arc<Vec<u8>>) -> Result<Self> {
        if !bytes.as_slice().starts_with(b"%PDF-") {
            return Err(PdfwerkError::PdfError("input is not a valid PDF header".into()));
        }
        let pdf = Pdf::new(bytes)
            .map_err(|_| PdfwerkError::PdfError("failed to parse PDF".into()))?;
        debug!(pages = pdf.pages().len(), "Document parsed for rendering");
        Ok(Self { pdf })
    }

    pub fn page_count(&self) -> u32 {
        self.pdf.pages().len() as u32
    }

    /// Page size in points at scale 1.0, after rotation is applied.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let page = self.page(page_number)?;
        Ok(page.render_dimensions())
    }

    /// Render `page_number` at `scale` times its intrinsic size.
    ///
    /// Fails with `Render` for a page outside the document, a scale that is
    /// not a positive number, output beyond [`MAX_SIDE_PX`] or [`MAX_PIXELS`],
    /// or a renderer panic on a malformed page.
    #[instrument(skip(self))]
    pub fn render(&self, page_number: u32, scale: f32) -> Result<PageImage> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(PdfwerkError::Render(format!(
                "scale must be a positive number, got {scale}"
            )));
        }
        let page = self.page(page_number)?;

        let (width_pt, height_pt) = page.render_dimensions();
        check_output_size(
            page_number,
            (width_pt * scale).ceil(),
            (height_pt * scale).ceil(),
        )?;

        let render_settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            bg_color: WHITE,
            ..Default::default()
        };
        let interpreter_settings = InterpreterSettings::default();
        let pixmap = catch_unwind(AssertUnwindSafe(|| {
            render(page, &interpreter_settings, &render_settings)
        }))
        .map_err(|_| PdfwerkError::Render(format!("renderer crashed on page {page_number}")))?;

        let width = pixmap.width() as u32;
        let height = pixmap.height() as u32;
        let image = RgbaImage::from_raw(width, height, pixmap.data_as_u8_slice().to_vec())
            .ok_or_else(|| {
                PdfwerkError::Render(format!(
                    "page {page_number}: pixel buffer does not match {width}x{height}"
                ))
            })?;

        debug!(page_number, width, height, "Page rendered");
        Ok(PageImage { page_number, image })
    }

    fn page(&self, page_number: u32) -> Result<&hayro::hayro_syntax::page::Page<'_>> {
        let count = self.page_count();
        if page_number == 0 || page_number > count {
            return Err(PdfwerkError::Render(format!(
                "page {page_number} is out of range (document has {count} pages)"
            )));
        }
        self.pdf
            .pages()
            .get(page_number as usize - 1)
            .ok_or_else(|| PdfwerkError::PdfError(format!("page {page_number} not found")))
    }
}

fn check_output_size(page_number: u32, width: f32, height: f32) -> Result<()> {
    let too_big = || {
        PdfwerkError::Render(format!(
            "page {page_number} would render at {width}x{height} px, which is too large; \
             use a smaller scale"
        ))
    };
    if !(width.is_finite() && height.is_finite()) {
        return Err(too_big());
    }
    if width > MAX_SIDE_PX as f32 || height > MAX_SIDE_PX as f32 {
        return Err(too_big());
    }
    if (width as u64) * (height as u64) > MAX_PIXELS {
        return Err(too_big());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PAGE_SIDE_PT, pdf_with_pages};

    fn rasterizer(pages: u32) -> Rasterizer {
        Rasterizer::from_bytes(Arc::new(pdf_with_pages(pages))).unwrap()
    }

    #[test]
    fn counts_pages() {
        assert_eq!(rasterizer(3).page_count(), 3);
    }

    #[test]
    fn render_scales_page_size() {
        let image = rasterizer(1).render(1, 0.5).unwrap();
        let expected = (PAGE_SIDE_PT * 0.5) as i64;
        assert!((image.width() as i64 - expected).abs() <= 1);
        assert!((image.height() as i64 - expected).abs() <= 1);
        assert_eq!(image.page_number, 1);
    }

    #[test]
    fn background_is_opaque_white() {
        let image = rasterizer(1).render(1, 0.25).unwrap();
        let corner = image.image.get_pixel(0, 0);
        assert_eq!(corner.0, [255, 255, 255, 255]);
    }

    #[test]
    fn page_size_is_in_points() {
        let (w, h) = rasterizer(2).page_size(2).unwrap();
        assert_eq!((w, h), (PAGE_SIDE_PT, PAGE_SIDE_PT));
    }

    #[test]
    fn out_of_range_pages_are_render_errors() {
        let r = rasterizer(2);
        assert!(matches!(r.render(0, 1.0), Err(PdfwerkError::Render(_))));
        assert!(matches!(r.render(3, 1.0), Err(PdfwerkError::Render(_))));
        assert!(matches!(r.page_size(3), Err(PdfwerkError::Render(_))));
    }

    #[test]
    fn non_positive_scale_is_a_render_error() {
        let r = rasterizer(1);
        assert!(matches!(r.render(1, 0.0), Err(PdfwerkError::Render(_))));
        assert!(matches!(r.render(1, -2.0), Err(PdfwerkError::Render(_))));
        assert!(matches!(r.render(1, f32::NAN), Err(PdfwerkError::Render(_))));
    }

    #[test]
    fn oversized_render_is_a_render_error() {
        let err = rasterizer(1).render(1, 1000.0).unwrap_err();
        assert!(matches!(err, PdfwerkError::Render(_)));
    }

    #[test]
    fn non_pdf_bytes_are_rejected() {
        let err = Rasterizer::from_bytes(Arc::new(b"hello".to_vec())).err().unwrap();
        assert!(matches!(err, PdfwerkError::PdfError(_)));
    }
}
