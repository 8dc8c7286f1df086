// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk — Core types, error definitions, configuration and localized labels
// shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod i18n;
pub mod types;

pub use config::AppConfig;
pub use error::PdfwerkError;
pub use i18n::Locale;
pub use types::*;
