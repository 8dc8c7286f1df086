// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One result slot per page. Slots are filled in completion order and read
// back in page order.

use pdfwerk_core::error::Result;
use pdfwerk_core::types::PageResult;
use tracing::warn;

#[derive(Debug)]
pub(crate) struct PageResults {
    slots: Vec<Option<PageResult>>,
    failure_marker: String,
}

impl PageResults {
    pub(crate) fn new(total: u32, failure_marker: impl Into<String>) -> Self {
        Self {
            slots: vec![None; total as usize],
            failure_marker: failure_marker.into(),
        }
    }

    /// Store the outcome for `page_number`. Returns `false` if the page is
    /// out of range or already has a result; the first outcome wins.
    pub(crate) fn record(&mut self, page_number: u32, outcome: Result<String>) -> bool {
        let Some(slot) = page_number
            .checked_sub(1)
            .and_then(|index| self.slots.get_mut(index as usize))
        else {
            warn!(page_number, "Result for a page outside the document");
            return false;
        };
        if slot.is_some() {
            warn!(page_number, "Duplicate result ignored");
            return false;
        }
        *slot = Some(match outcome {
            Ok(text) => PageResult::recognized(page_number, text.trim()),
            Err(err) => {
                warn!(page_number, error = %err, "Page failed");
                PageResult::failed(page_number, self.failure_marker.as_str())
            }
        });
        true
    }

    /// Pages that have no result yet, ascending.
    pub(crate) fn missing(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index as u32 + 1)
            .collect()
    }

    /// Results in page order. Any page still missing becomes a failure.
    pub(crate) fn into_vec(self) -> Vec<PageResult> {
        let marker = self.failure_marker;
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| PageResult::failed(index as u32 + 1, marker.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfwerk_core::PdfwerkError;

    #[test]
    fn results_come_back_in_page_order() {
        let mut results = PageResults::new(3, "[failed]");
        assert!(results.record(3, Ok("three".into())));
        assert!(results.record(1, Ok("  one \n".into())));
        assert!(results.record(2, Err(PdfwerkError::page(2, "boom"))));

        let results = results.into_vec();
        assert_eq!(results[0], PageResult::recognized(1, "one"));
        assert_eq!(results[1], PageResult::failed(2, "[failed]"));
        assert_eq!(results[2], PageResult::recognized(3, "three"));
    }

    #[test]
    fn first_outcome_wins() {
        let mut results = PageResults::new(1, "x");
        assert!(results.record(1, Ok("first".into())));
        assert!(!results.record(1, Ok("second".into())));
        assert_eq!(results.into_vec()[0].text, "first");
    }

    #[test]
    fn out_of_range_pages_are_ignored() {
        let mut results = PageResults::new(2, "x");
        assert!(!results.record(0, Ok(String::new())));
        assert!(!results.record(3, Ok(String::new())));
        assert_eq!(results.missing(), vec![1, 2]);
    }

    #[test]
    fn unfilled_slots_become_failures() {
        let mut results = PageResults::new(2, "[failed]");
        results.record(2, Ok("two".into()));
        let results = results.into_vec();
        assert_eq!(results.len(), 2);
        assert!(results[0].failed);
        assert_eq!(results[0].page_number, 1);
    }
}
