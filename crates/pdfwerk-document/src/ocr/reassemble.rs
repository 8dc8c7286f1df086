// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transcript reassembly — join per-page results into one text in page order.

use std::sync::OnceLock;

use pdfwerk_core::i18n::Labels;
use pdfwerk_core::types::PageResult;
use regex::Regex;
use serde::Serialize;

use crate::ocr::normalize::normalize_page_text;

fn blank_line_run() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").ok()).as_ref()
}

/// Final text of an OCR job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Transcript {
    Text(String),
    /// No page produced any text, not even a failure marker.
    Empty,
}

impl Transcript {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Build the transcript for `results`, which must be in page order.
///
/// Each page becomes a banner line, a blank line, and the page body.
/// Recognized text is normalized; failure markers are kept verbatim and count
/// as text. Pages are separated by exactly one blank line.
pub fn assemble_transcript(results: &[PageResult], labels: &Labels) -> Transcript {
    let bodies: Vec<(u32, String)> = results
        .iter()
        .map(|result| {
            let body = if result.failed {
                result.text.clone()
            } else {
                normalize_page_text(&result.text)
            };
            (result.page_number, body)
        })
        .collect();

    if bodies.iter().all(|(_, body)| body.is_empty()) {
        return Transcript::Empty;
    }

    let joined = bodies
        .iter()
        .map(|(page_number, body)| format!("\n{}\n\n{}\n", labels.page_banner(*page_number), body))
        .collect::<Vec<_>>()
        .join("\n");
    let collapsed = match blank_line_run() {
        Some(re) => re.replace_all(&joined, "\n\n").into_owned(),
        None => joined,
    };
    Transcript::Text(collapsed.trim_start_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfwerk_core::i18n::Locale;

    #[test]
    fn pages_are_bannered_in_order() {
        let results = vec![
            PageResult::recognized(1, "中 文"),
            PageResult::recognized(2, "Hello   world"),
        ];
        let transcript = assemble_transcript(&results, Locale::En.labels());
        let expected = "==================== Page 1 ====================\n\n中文\n\n\
                        ==================== Page 2 ====================\n\nHello world\n";
        assert_eq!(transcript, Transcript::Text(expected.to_string()));
    }

    #[test]
    fn failure_marker_is_kept_and_counts_as_text() {
        let labels = Locale::Zh.labels();
        let results = vec![
            PageResult::recognized(1, "   "),
            PageResult::failed(2, labels.failure_marker),
        ];
        let transcript = assemble_transcript(&results, labels);
        let text = transcript.text().unwrap();
        assert!(text.contains("第 2 页"));
        assert!(text.contains("[识别失败]"));
    }

    #[test]
    fn all_blank_pages_give_empty_transcript() {
        let results = vec![
            PageResult::recognized(1, ""),
            PageResult::recognized(2, " \n\n "),
        ];
        assert!(assemble_transcript(&results, Locale::Zh.labels()).is_empty());
        assert!(assemble_transcript(&[], Locale::Zh.labels()).is_empty());
    }

    #[test]
    fn blank_page_between_text_keeps_its_banner() {
        let results = vec![
            PageResult::recognized(1, "a"),
            PageResult::recognized(2, ""),
            PageResult::recognized(3, "c"),
        ];
        let text = match assemble_transcript(&results, Locale::En.labels()) {
            Transcript::Text(text) => text,
            Transcript::Empty => panic!("expected text"),
        };
        assert!(text.contains("Page 2"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_string(&Transcript::Empty).unwrap();
        assert_eq!(json, r#"{"kind":"empty"}"#);
    }
}
