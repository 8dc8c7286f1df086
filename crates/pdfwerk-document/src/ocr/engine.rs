// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engine seam.

use pdfwerk_core::error::Result;
use pdfwerk_core::types::OcrLanguage;

use crate::render::PageImage;

/// One initialized recognizer, owned by exactly one worker.
///
/// Engines are driven from blocking threads, one page at a time.
pub trait RecognitionEngine: Send {
    /// Recognize the text on one rendered page.
    fn recognize(&mut self, page: &PageImage) -> Result<String>;

    /// Release resources held by the engine. Called exactly once per engine,
    /// on both success and failure paths.
    fn terminate(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Builds engines for a worker pool.
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: RecognitionEngine + 'static;

    /// Create one engine for `language`. Must fail with `EngineInit` when the
    /// engine or its language data is unavailable.
    fn create(&self, language: &OcrLanguage) -> Result<Self::Engine>;
}
