// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR module — parallel text recognition over the pages of a PDF.
//
// A `WorkerPool` holds one recognition engine per worker. The dispatcher hands
// pages to workers, every page yields exactly one `PageResult` (a failure
// marker when rendering or recognition fails), and the reassembler joins the
// normalized page texts into a transcript in page order.
//
// Two engines are available: `tesseract` (external CLI, always built) and
// `ocrs` (pure Rust, behind the `ocr` feature).

pub mod dispatch;
pub mod engine;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod reassemble;
pub mod results;
pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod ocrs;

pub use dispatch::plan_groups;
pub use engine::{EngineFactory, RecognitionEngine};
pub use normalize::normalize_page_text;
pub use pipeline::{DEFAULT_TRANSCRIPT_NAME, OcrOptions, OcrOutcome, OcrPipeline};
pub use pool::WorkerPool;
pub use progress::ProgressReporter;
pub use reassemble::{Transcript, assemble_transcript};
pub use tesseract::{TesseractConfig, TesseractEngine, TesseractFactory};

#[cfg(feature = "ocr")]
pub use self::ocrs::{OcrsConfig, OcrsEngine, OcrsFactory};
