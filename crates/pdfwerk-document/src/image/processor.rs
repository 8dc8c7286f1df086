// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — encode rendered pages as PNG, JPEG or WebP using the
// `image` crate.

use image::{DynamicImage, RgbaImage};
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::{ImageFormat, Quality};
use tracing::{debug, instrument};

/// Wraps one in-memory image and turns it into encoded bytes.
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decode an encoded image (any format the `image` crate reads).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| PdfwerkError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(width = image.width(), height = image.height(), "Image decoded");
        Ok(Self { image })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Output ---------------------------------------------------------------

    /// Encode in `format`. `quality` applies to JPEG only; PNG and WebP are
    /// written lossless.
    pub fn encode(&self, format: ImageFormat, quality: Quality) -> Result<Vec<u8>> {
        match format {
            ImageFormat::Png => self.to_png_bytes(),
            ImageFormat::Jpeg => self.to_jpeg_bytes(quality),
            ImageFormat::Webp => self.to_webp_bytes(),
        }
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, image::ImageFormat::Png)
    }

    /// JPEG has no alpha channel; the image is flattened to RGB first.
    pub fn to_jpeg_bytes(&self, quality: Quality) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());
        rgb.write_with_encoder(encoder)
            .map_err(|err| PdfwerkError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    pub fn to_webp_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, image::ImageFormat::WebP)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| PdfwerkError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImageProcessor {
        ImageProcessor::from_rgba(RgbaImage::from_pixel(8, 6, image::Rgba([10, 120, 200, 255])))
    }

    fn full() -> Quality {
        Quality::from_percent(100).unwrap()
    }

    #[test]
    fn encodes_each_format_with_its_signature() {
        let png = sample().encode(ImageFormat::Png, full()).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let jpeg = sample().encode(ImageFormat::Jpeg, full()).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));

        let webp = sample().encode(ImageFormat::Webp, full()).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn png_round_trip_keeps_dimensions() {
        let png = sample().to_png_bytes().unwrap();
        let decoded = ImageProcessor::from_bytes(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn lower_quality_jpeg_is_smaller() {
        let noisy = RgbaImage::from_fn(64, 64, |x, y| {
            image::Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8, 255])
        });
        let processor = ImageProcessor::from_rgba(noisy);
        let high = processor.to_jpeg_bytes(full()).unwrap();
        let low = processor
            .to_jpeg_bytes(Quality::from_percent(10).unwrap())
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"nope"),
            Err(PdfwerkError::ImageError(_))
        ));
    }
}
