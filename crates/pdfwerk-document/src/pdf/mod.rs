// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF structure: reading, merging and splitting with lopdf, and building
// image-only documents.

pub mod reader;
pub mod writer;

pub use reader::PdfReader;
pub use writer::PdfWriter;
