// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfwerk.

use thiserror::Error;

/// Top-level error type for all pdfwerk operations.
#[derive(Debug, Error)]
pub enum PdfwerkError {
    // -- Caller input --
    /// Rejected before the operation starts (missing file, bad page range,
    /// too few documents, empty page selection, ...).
    #[error("invalid input: {0}")]
    InputValidation(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("export failed: {0}")]
    Export(String),

    // -- OCR errors --
    /// A recognition worker could not be created. Fatal to the whole job.
    #[error("OCR engine failed to initialise: {0}")]
    EngineInit(String),

    /// Rendering or recognition failed for a single page. Recovered locally by
    /// the OCR pipeline and recorded in that page's result.
    #[error("page {page} could not be processed: {reason}")]
    PageProcessing { page: u32, reason: String },

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PdfwerkError {
    /// Wrap any error as a page-local failure for `page`.
    pub fn page(page: u32, reason: impl std::fmt::Display) -> Self {
        Self::PageProcessing {
            page,
            reason: reason.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfwerkError>;
