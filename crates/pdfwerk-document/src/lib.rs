// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk-document — the document operations behind pdfwerk.
//
// PDF structure work (merge, split) goes through lopdf. Anything that needs
// pixels goes through the hayro rasterizer: image export, compression by
// re-rendering, and OCR with a pool of recognition engines.

pub mod compress;
pub mod convert;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod render;

#[cfg(test)]
pub(crate) mod test_support;

pub use compress::compress_pdf;
pub use convert::{ConvertOptions, ImageArchive, convert_to_images};
pub use image::processor::ImageProcessor;
pub use ocr::{OcrOptions, OcrOutcome, OcrPipeline, ProgressReporter, Transcript};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use render::{PageImage, Rasterizer};
