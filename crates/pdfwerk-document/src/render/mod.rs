// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — rasterize PDF pages into RGBA images.

pub mod rasterizer;

pub use rasterizer::{PageImage, Rasterizer};
