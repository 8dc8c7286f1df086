// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Whitespace normalization for recognized page text.
//
// Recognizers for Chinese tend to emit a space between every ideograph and
// around full-width punctuation. Normalization removes those, collapses the
// remaining whitespace, and is idempotent.

use std::sync::OnceLock;

use regex::Regex;

/// Whitespace around full-width CJK punctuation.
fn punctuation_gap() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*([，。！？；：、（）【】《》])\s*").ok())
        .as_ref()
}

fn whitespace_run() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").ok()).as_ref()
}

/// CJK Unified Ideographs, Extension A, and Compatibility Ideographs.
pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}')
}

/// Normalize one page of raw recognizer output into a single line.
///
/// Lines are trimmed and blank ones dropped, whitespace between two
/// ideographs is removed, whitespace around full-width punctuation is
/// removed, and any other whitespace run becomes one space.
pub fn normalize_page_text(raw: &str) -> String {
    let joined = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let mut text = remove_gaps_between_ideographs(&joined);
    if let Some(re) = punctuation_gap() {
        text = re.replace_all(&text, "$1").into_owned();
    }
    if let Some(re) = whitespace_run() {
        text = re.replace_all(&text, " ").into_owned();
    }
    text.trim().to_string()
}

/// Drop every whitespace run whose neighbours on both sides are ideographs.
///
/// A scan rather than a regex so that chains such as `中 文 字` lose every
/// gap in one pass.
fn remove_gaps_between_ideographs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut previous: Option<char> = None;

    for c in text.chars() {
        if c.is_whitespace() {
            pending.push(c);
            continue;
        }
        if !pending.is_empty() {
            let bridges_ideographs =
                previous.is_some_and(is_cjk_ideograph) && is_cjk_ideograph(c);
            if !bridges_ideographs {
                out.push_str(&pending);
            }
            pending.clear();
        }
        out.push(c);
        previous = Some(c);
    }
    out.push_str(&pending);
    out
}
