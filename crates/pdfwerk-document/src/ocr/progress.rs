// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job progress, published over a `tokio::sync::watch` channel so any number
// of observers can read the latest `completed/total` without slowing workers.

use std::sync::Arc;

use pdfwerk_core::types::JobProgress;
use tokio::sync::watch;
use tracing::trace;

/// Cloneable progress handle shared between a job and its observers.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<JobProgress>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(JobProgress::default());
        Self { tx: Arc::new(tx) }
    }

    /// Receive every update from now on.
    pub fn subscribe(&self) -> watch::Receiver<JobProgress> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> JobProgress {
        *self.tx.borrow()
    }

    /// Start a job of `total` pages with nothing completed.
    pub(crate) fn begin(&self, total: u32) {
        self.tx.send_replace(JobProgress {
            total,
            completed: 0,
        });
    }

    /// Record one more finished page, successful or not.
    pub(crate) fn page_done(&self) {
        self.tx.send_modify(|progress| {
            debug_assert!(progress.completed < progress.total);
            progress.completed = progress.completed.saturating_add(1).min(progress.total);
            trace!(completed = progress.completed, total = progress.total, "Progress");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_to_total() {
        let progress = ProgressReporter::new();
        progress.begin(3);
        assert_eq!(progress.snapshot(), JobProgress { total: 3, completed: 0 });

        progress.page_done();
        progress.page_done();
        assert_eq!(progress.snapshot().completed, 2);
        assert!(!progress.snapshot().is_finished());

        progress.page_done();
        assert!(progress.snapshot().is_finished());
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let progress = ProgressReporter::new();
        let mut rx = progress.subscribe();
        let worker = progress.clone();

        worker.begin(2);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().total, 2);

        worker.page_done();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().completed, 1);
    }
}
