// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the pdfwerk toolbox.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PdfwerkError, Result};

/// Unique identifier for one operation invocation (merge, split, OCR, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Page addressing ----------------------------------------------------------

/// Inclusive, 1-based page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check the range against a document with `page_count` pages.
    pub fn validate(&self, page_count: u32) -> Result<()> {
        if self.start == 0 || self.end == 0 {
            return Err(PdfwerkError::InputValidation(
                "page numbers start at 1".into(),
            ));
        }
        if self.start > self.end {
            return Err(PdfwerkError::InputValidation(format!(
                "start page {} is after end page {}",
                self.start, self.end
            )));
        }
        if self.end > page_count {
            return Err(PdfwerkError::InputValidation(format!(
                "end page {} is beyond the last page ({})",
                self.end, page_count
            )));
        }
        Ok(())
    }

    /// Number of pages covered by the range; 0 when it runs backwards.
    pub fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// A user-chosen subset of pages, e.g. `1,3-5` or `all`.
///
/// Ranges are kept as written and only expanded against a real page count,
/// so `1-4294967295` costs nothing until it is resolved and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    All,
    Ranges(Vec<PageRange>),
}

impl PageSelection {
    pub fn none() -> Self {
        Self::Ranges(Vec::new())
    }

    /// True when nothing is selected. `All` is never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Ranges(ranges) if ranges.iter().all(PageRange::is_empty))
    }

    /// Expand the selection into ascending, distinct page numbers for a
    /// document with `page_count` pages.
    ///
    /// An empty selection or a page beyond the end is an input error.
    pub fn resolve(&self, page_count: u32) -> Result<Vec<u32>> {
        let pages: Vec<u32> = match self {
            Self::All => (1..=page_count).collect(),
            Self::Ranges(ranges) => {
                let last = ranges.iter().map(|range| range.end).max().unwrap_or(0);
                if last > page_count {
                    return Err(PdfwerkError::InputValidation(format!(
                        "page {} is beyond the last page ({})",
                        last, page_count
                    )));
                }
                // Bounded by `page_count` from here on.
                let distinct: BTreeSet<u32> = ranges.iter().flat_map(PageRange::pages).collect();
                distinct.into_iter().collect()
            }
        };
        if pages.is_empty() {
            return Err(PdfwerkError::InputValidation(
                "select at least one page".into(),
            ));
        }
        Ok(pages)
    }
}

impl FromStr for PageSelection {
    type Err = PdfwerkError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let mut ranges = Vec::new();
        for token in trimmed.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let range = match token.split_once('-') {
                Some((a, b)) => PageRange::new(parse_page(a)?, parse_page(b)?),
                None => {
                    let page = parse_page(token)?;
                    PageRange::new(page, page)
                }
            };
            if range.is_empty() {
                return Err(PdfwerkError::InputValidation(format!(
                    "page range {token} runs backwards"
                )));
            }
            ranges.push(range);
        }
        Ok(Self::Ranges(ranges))
    }
}

fn parse_page(token: &str) -> Result<u32> {
    match token.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(PdfwerkError::InputValidation(format!(
            "`{}` is not a page number",
            token.trim()
        ))),
        Ok(page) => Ok(page),
    }
}

// -- Output formats -----------------------------------------------------------

/// Image formats offered by the convert-to-image operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = PdfwerkError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(PdfwerkError::InputValidation(format!(
                "unsupported image format `{other}` (expected png, jpeg or webp)"
            ))),
        }
    }
}

/// Lossy compression factor in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quality(f32);

impl Quality {
    /// Build from a user-facing percentage in 1..=100.
    pub fn from_percent(percent: u32) -> Result<Self> {
        if !(1..=100).contains(&percent) {
            return Err(PdfwerkError::InputValidation(format!(
                "quality must be between 1 and 100, got {percent}"
            )));
        }
        Ok(Self(percent as f32 / 100.0))
    }

    pub fn from_factor(factor: f32) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
            return Err(PdfwerkError::InputValidation(format!(
                "quality factor must be in (0, 1], got {factor}"
            )));
        }
        Ok(Self(factor))
    }

    pub fn factor(&self) -> f32 {
        self.0
    }

    /// Quality on the 1..=100 scale used by JPEG encoders.
    pub fn jpeg_quality(&self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

// -- OCR ------------------------------------------------------------------------

/// Recognition language in Tesseract notation (`chi_sim`, `eng`,
/// `chi_sim+eng`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OcrLanguage(String);

impl OcrLanguage {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let valid = !code.is_empty()
            && code.split('+').all(|part| {
                !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            });
        if !valid {
            return Err(PdfwerkError::InputValidation(format!(
                "`{code}` is not a recognition language code"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual languages of a combined code such as `chi_sim+eng`.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('+')
    }
}

impl Default for OcrLanguage {
    fn default() -> Self {
        Self("chi_sim".into())
    }
}

impl std::fmt::Display for OcrLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OcrLanguage {
    type Err = PdfwerkError;

    fn from_str(input: &str) -> Result<Self> {
        Self::new(input.trim())
    }
}

impl TryFrom<String> for OcrLanguage {
    type Error = PdfwerkError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<OcrLanguage> for String {
    fn from(value: OcrLanguage) -> Self {
        value.0
    }
}

/// How pages are handed to OCR workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// Pages are cut into groups the size of the pool; worker `i` takes the
    /// `i`-th page of each group and the next group waits for the whole group.
    #[default]
    PageGroups,
    /// Workers pull page numbers from a shared queue until it is empty.
    WorkQueue,
}

impl FromStr for DispatchStrategy {
    type Err = PdfwerkError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "groups" | "page_groups" => Ok(Self::PageGroups),
            "queue" | "work_queue" => Ok(Self::WorkQueue),
            other => Err(PdfwerkError::InputValidation(format!(
                "unknown dispatch strategy `{other}` (expected groups or queue)"
            ))),
        }
    }
}

/// Recognition backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Tesseract,
    Ocrs,
}

impl FromStr for EngineKind {
    type Err = PdfwerkError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ocrs" => Ok(Self::Ocrs),
            other => Err(PdfwerkError::InputValidation(format!(
                "unknown OCR engine `{other}` (expected tesseract or ocrs)"
            ))),
        }
    }
}

/// Recognition outcome for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number.
    pub page_number: u32,
    /// Recognized text, or the failure marker when `failed` is set.
    pub text: String,
    pub failed: bool,
}

impl PageResult {
    pub fn recognized(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            failed: false,
        }
    }

    pub fn failed(page_number: u32, marker: impl Into<String>) -> Self {
        Self {
            page_number,
            text: marker.into(),
            failed: true,
        }
    }
}

/// OCR job progress. `completed` only ever grows; `total` is fixed when the
/// job starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub total: u32,
    pub completed: u32,
}

impl JobProgress {
    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }

    /// Percentage complete (0–100).
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed as u64 * 100) / self.total as u64).min(100) as u8
    }
}

// -- Presentation-facing job status ------------------------------------------

/// The user-triggerable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Merge,
    Split,
    Convert,
    Compress,
    Ocr,
}

/// Lifecycle of one operation as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Idle,
    Running {
        job_id: JobId,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        job_id: JobId,
        finished_at: DateTime<Utc>,
    },
    Failed {
        job_id: JobId,
        message: String,
    },
}

impl OperationStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_range_rejects_reversed_and_out_of_bounds() {
        assert!(PageRange::new(3, 2).validate(10).is_err());
        assert!(PageRange::new(0, 2).validate(10).is_err());
        assert!(PageRange::new(2, 11).validate(10).is_err());
        assert!(PageRange::new(2, 10).validate(10).is_ok());
        assert_eq!(PageRange::new(2, 5).len(), 4);
    }

    #[test]
    fn reversed_range_has_no_pages() {
        let range = PageRange::new(5, 2);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.pages().count(), 0);
        assert_eq!(PageRange::new(3, 3).len(), 1);
        assert_eq!(PageRange::new(1, u32::MAX).len(), u32::MAX);
    }

    #[test]
    fn huge_selection_parses_instantly_and_fails_on_resolve() {
        let started = std::time::Instant::now();
        let selection: PageSelection = "1-4294967295".parse().unwrap();
        assert!(!selection.is_empty());
        let err = selection.resolve(3).unwrap_err();
        assert!(matches!(err, PdfwerkError::InputValidation(_)));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn overlapping_ranges_resolve_to_distinct_pages() {
        let selection: PageSelection = "2-4,3,1-2".parse().unwrap();
        assert_eq!(selection.resolve(5).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn selection_parses_lists_and_ranges() {
        let selection: PageSelection = "3-5, 1,4".parse().unwrap();
        assert_eq!(selection.resolve(6).unwrap(), vec![1, 3, 4, 5]);
    }

    #[test]
    fn selection_all_expands_to_every_page() {
        let selection: PageSelection = "ALL".parse().unwrap();
        assert_eq!(selection.resolve(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_selection_is_input_error() {
        let err = PageSelection::none().resolve(4).unwrap_err();
        assert!(matches!(err, PdfwerkError::InputValidation(_)));
        let parsed: PageSelection = " , ".parse().unwrap();
        assert!(parsed.resolve(4).is_err());
    }

    #[test]
    fn selection_rejects_zero_and_backwards_ranges() {
        assert!("0".parse::<PageSelection>().is_err());
        assert!("5-2".parse::<PageSelection>().is_err());
        assert!("x".parse::<PageSelection>().is_err());
    }

    #[test]
    fn selection_beyond_last_page_is_rejected() {
        let selection: PageSelection = "2-9".parse().unwrap();
        assert!(selection.resolve(4).is_err());
    }

    #[test]
    fn quality_maps_percent_to_factor() {
        let q = Quality::from_percent(50).unwrap();
        assert!((q.factor() - 0.5).abs() < f32::EPSILON);
        assert_eq!(q.jpeg_quality(), 50);
        assert!(Quality::from_percent(0).is_err());
        assert!(Quality::from_percent(101).is_err());
        assert!(Quality::from_factor(0.0).is_err());
        assert!(Quality::from_factor(1.0).is_ok());
    }

    #[test]
    fn language_codes_are_validated() {
        assert!(OcrLanguage::new("chi_sim+eng").is_ok());
        assert!(OcrLanguage::new("").is_err());
        assert!(OcrLanguage::new("eng+").is_err());
        assert!(OcrLanguage::new("../etc").is_err());
        let lang = OcrLanguage::new("chi_sim+eng").unwrap();
        assert_eq!(lang.components().collect::<Vec<_>>(), vec!["chi_sim", "eng"]);
    }

    #[test]
    fn format_and_strategy_parse_from_cli_words() {
        assert_eq!("JPG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert!("gif".parse::<ImageFormat>().is_err());
        assert_eq!(
            "queue".parse::<DispatchStrategy>().unwrap(),
            DispatchStrategy::WorkQueue
        );
        assert_eq!("ocrs".parse::<EngineKind>().unwrap(), EngineKind::Ocrs);
    }

    #[test]
    fn progress_percent() {
        let progress = JobProgress {
            total: 3,
            completed: 1,
        };
        assert_eq!(progress.percent(), 33);
        assert!(!progress.is_finished());
        assert_eq!(JobProgress::default().percent(), 100);
    }
}
