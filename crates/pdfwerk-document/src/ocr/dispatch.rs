// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page dispatcher — hands pages to pool workers.
//
// `PageGroups` cuts pages 1..=N into consecutive groups the size of the pool.
// Worker `i` takes the `i`-th page of a group and the next group starts only
// once every page of the current one has an outcome. `WorkQueue` lets each
// worker pull the next unclaimed page as soon as it is free.
//
// Under either strategy every page is recorded exactly once and progress
// advances once per page, in completion order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use pdfwerk_core::error::PdfwerkError;
use pdfwerk_core::types::DispatchStrategy;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument, warn};

use crate::ocr::engine::RecognitionEngine;
use crate::ocr::pool::{WorkerPool, run_page};
use crate::ocr::progress::ProgressReporter;
use crate::ocr::results::PageResults;

/// Partition pages `1..=total_pages` into consecutive groups of at most
/// `pool_size` pages.
///
/// `plan_groups(3, 2)` is `[[1, 2], [3]]`.
pub fn plan_groups(total_pages: u32, pool_size: usize) -> Vec<Vec<u32>> {
    let group_size = u32::try_from(pool_size).unwrap_or(u32::MAX).max(1);
    let mut groups = Vec::new();
    let mut start = 1;
    while start <= total_pages {
        let end = start.saturating_add(group_size - 1).min(total_pages);
        groups.push((start..=end).collect());
        if end == total_pages {
            break;
        }
        start = end + 1;
    }
    groups
}

/// Run every page of the document through `pool`, filling `results`.
#[instrument(skip(pool, results, progress), fields(workers = pool.size()))]
pub(crate) async fn dispatch<E: RecognitionEngine + 'static>(
    pool: &WorkerPool<E>,
    strategy: DispatchStrategy,
    total_pages: u32,
    scale: f32,
    results: &mut PageResults,
    progress: &ProgressReporter,
) {
    match strategy {
        DispatchStrategy::PageGroups => {
            dispatch_groups(pool, total_pages, scale, results, progress).await
        }
        DispatchStrategy::WorkQueue => {
            dispatch_queue(pool, total_pages, scale, results, progress).await
        }
    }

    // A task that died without reporting still owes its page a result.
    for page_number in results.missing() {
        error!(page_number, "No outcome reported for page");
        results.record(
            page_number,
            Err(PdfwerkError::page(page_number, "worker did not report a result")),
        );
        progress.page_done();
    }
}

async fn dispatch_groups<E: RecognitionEngine + 'static>(
    pool: &WorkerPool<E>,
    total_pages: u32,
    scale: f32,
    results: &mut PageResults,
    progress: &ProgressReporter,
) {
    for (index, group) in plan_groups(total_pages, pool.size()).into_iter().enumerate() {
        debug!(group = index + 1, pages = ?group, "Dispatching page group");
        let mut tasks = JoinSet::new();

        for (slot, page_number) in group.into_iter().enumerate() {
            let Some(worker) = pool.worker(slot) else {
                warn!(slot, page_number, "No worker for group slot");
                continue;
            };
            tasks.spawn_blocking(move || (page_number, run_page(&worker, page_number, scale)));
        }

        // Barrier: the next group waits for every page of this one.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((page_number, outcome)) => {
                    if results.record(page_number, outcome) {
                        progress.page_done();
                    }
                }
                Err(err) => error!(error = %err, "Page task did not complete"),
            }
        }
    }
}

async fn dispatch_queue<E: RecognitionEngine + 'static>(
    pool: &WorkerPool<E>,
    total_pages: u32,
    scale: f32,
    results: &mut PageResults,
    progress: &ProgressReporter,
) {
    let queue: Arc<Mutex<VecDeque<u32>>> = Arc::new(Mutex::new((1..=total_pages).collect()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handles: Vec<_> = (0..pool.size())
        .filter_map(|index| pool.worker(index))
        .map(|worker| {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            tokio::task::spawn_blocking(move || {
                loop {
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some(page_number) = next else {
                        break;
                    };
                    let outcome = run_page(&worker, page_number, scale);
                    if tx.send((page_number, outcome)).is_err() {
                        break;
                    }
                }
            })
        })
        .collect();
    drop(tx);

    while let Some((page_number, outcome)) = rx.recv().await {
        if results.record(page_number, outcome) {
            progress.page_done();
        }
    }

    for handle in handles {
        if let Err(err) = handle.await {
            error!(error = %err, "Queue worker did not complete");
        }
    }
}
