// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Worker pool — a fixed set of recognition workers for one OCR job.
//
// Each worker owns one engine and its own rasterizer over the shared document
// bytes, so rendering and recognition of a page both happen on the worker's
// thread. Workers sit behind a mutex: a worker processes at most one page at
// a time. Every engine that was created is terminated exactly once, whether
// the job finishes, fails to start, or is dropped.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::OcrLanguage;
use tracing::{debug, error, info, instrument, warn};

use crate::ocr::engine::{EngineFactory, RecognitionEngine};
use crate::render::Rasterizer;

pub(crate) type SharedWorker<E> = Arc<Mutex<Worker<E>>>;

pub(crate) struct Worker<E: RecognitionEngine> {
    pub(crate) id: usize,
    engine: E,
    rasterizer: Rasterizer,
    terminated: bool,
}

impl<E: RecognitionEngine> Worker<E> {
    /// Render then recognize one page. The page image is dropped before
    /// returning.
    fn process(&mut self, page_number: u32, scale: f32) -> Result<String> {
        let image = self
            .rasterizer
            .render(page_number, scale)
            .map_err(|err| PdfwerkError::page(page_number, err))?;
        self.engine
            .recognize(&image)
            .map_err(|err| PdfwerkError::page(page_number, err))
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        match self.engine.terminate() {
            Ok(()) => debug!(worker = self.id, "Worker terminated"),
            Err(err) => warn!(worker = self.id, error = %err, "Engine did not terminate cleanly"),
        }
    }
}

/// Lock a worker, recovering it if a previous page panicked mid-recognition.
pub(crate) fn lock_worker<E: RecognitionEngine>(
    worker: &Mutex<Worker<E>>,
) -> MutexGuard<'_, Worker<E>> {
    worker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one page on `worker`. Panics inside rendering or recognition are
/// caught and reported as a page failure.
pub(crate) fn run_page<E: RecognitionEngine>(
    worker: &Mutex<Worker<E>>,
    page_number: u32,
    scale: f32,
) -> Result<String> {
    let mut guard = lock_worker(worker);
    match catch_unwind(AssertUnwindSafe(|| guard.process(page_number, scale))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            error!(worker = guard.id, page_number, "Worker panicked");
            Err(PdfwerkError::page(page_number, panic_message(payload.as_ref())))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic during page processing".to_string()
    }
}

/// Recognition workers for one job.
pub struct WorkerPool<E: RecognitionEngine> {
    workers: Vec<SharedWorker<E>>,
}

impl<E: RecognitionEngine + 'static> WorkerPool<E> {
    /// Number of workers to start: `min(desired, configured_max, pages)`,
    /// but never fewer than one.
    pub fn planned_size(desired: usize, configured_max: usize, pages: u32) -> usize {
        desired
            .min(configured_max)
            .min(pages as usize)
            .max(1)
    }

    /// Create `size` workers concurrently.
    ///
    /// If any engine fails to initialize, the engines that did start are
    /// terminated and the whole pool fails with `EngineInit`.
    #[instrument(skip(factory, language, pdf), fields(language = %language))]
    pub async fn spawn<F>(
        factory: Arc<F>,
        language: &OcrLanguage,
        size: usize,
        pdf: Arc<Vec<u8>>,
    ) -> Result<Self>
    where
        F: EngineFactory<Engine = E>,
    {
        let size = size.max(1);
        let handles: Vec<_> = (0..size)
            .map(|id| {
                let factory = Arc::clone(&factory);
                let language = language.clone();
                let pdf = Arc::clone(&pdf);
                tokio::task::spawn_blocking(move || -> Result<Worker<E>> {
                    let engine = factory.create(&language)?;
                    let rasterizer = match Rasterizer::from_bytes(pdf) {
                        Ok(rasterizer) => rasterizer,
                        Err(err) => {
                            let mut engine = engine;
                            if let Err(term_err) = engine.terminate() {
                                warn!(
                                    worker = id,
                                    error = %term_err,
                                    "Engine did not terminate cleanly"
                                );
                            }
                            return Err(err);
                        }
                    };
                    Ok(Worker {
                        id,
                        engine,
                        rasterizer,
                        terminated: false,
                    })
                })
            })
            .collect();

        let mut workers = Vec::with_capacity(size);
        let mut first_error: Option<PdfwerkError> = None;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(worker)) => workers.push(Arc::new(Mutex::new(worker))),
                Ok(Err(err)) => {
                    warn!(worker = id, error = %err, "Worker failed to start");
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    error!(worker = id, error = %join_err, "Worker start-up task failed");
                    first_error.get_or_insert(PdfwerkError::EngineInit(format!(
                        "worker {id} could not start: {join_err}"
                    )));
                }
            }
        }

        let pool = Self { workers };
        if let Some(err) = first_error {
            let started = pool.size();
            pool.release().await;
            let err = match err {
                PdfwerkError::EngineInit(_) => err,
                other => PdfwerkError::EngineInit(other.to_string()),
            };
            error!(started, requested = size, error = %err, "Worker pool failed to start");
            return Err(err);
        }

        info!(workers = size, "Worker pool ready");
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn worker(&self, index: usize) -> Option<SharedWorker<E>> {
        self.workers.get(index).cloned()
    }

    /// Terminate every worker exactly once.
    pub async fn release(mut self) {
        let workers = std::mem::take(&mut self.workers);
        if workers.is_empty() {
            return;
        }
        let count = workers.len();
        let released = tokio::task::spawn_blocking(move || terminate_all(&workers)).await;
        match released {
            Ok(()) => debug!(workers = count, "Worker pool released"),
            Err(err) => error!(error = %err, "Worker pool release task failed"),
        }
    }
}

fn terminate_all<E: RecognitionEngine>(workers: &[SharedWorker<E>]) {
    for worker in workers {
        lock_worker(worker).terminate();
    }
}

impl<E: RecognitionEngine> Drop for WorkerPool<E> {
    fn drop(&mut self) {
        // Only reached with workers left when the job unwound without
        // calling `release`.
        if !self.workers.is_empty() {
            warn!(workers = self.workers.len(), "Worker pool dropped without release");
            terminate_all(&self.workers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedEngine, ScriptedFactory, pdf_with_pages};

    type Pool = WorkerPool<ScriptedEngine>;

    #[test]
    fn planned_size_is_bounded_by_pages_and_config() {
        assert_eq!(Pool::planned_size(4, 4, 10), 4);
        assert_eq!(Pool::planned_size(8, 4, 10), 4);
        assert_eq!(Pool::planned_size(4, 4, 2), 2);
        assert_eq!(Pool::planned_size(0, 4, 2), 1);
    }

    #[tokio::test]
    async fn every_engine_is_terminated_once_on_release() {
        let factory = Arc::new(ScriptedFactory::default());
        let pool = WorkerPool::spawn(
            Arc::clone(&factory),
            &OcrLanguage::default(),
            3,
            Arc::new(pdf_with_pages(3)),
        )
        .await
        .unwrap();
        assert_eq!(pool.size(), 3);

        pool.release().await;
        assert_eq!(factory.stats().created(), 3);
        assert_eq!(factory.stats().terminated(), 3);
    }

    #[tokio::test]
    async fn init_failure_terminates_the_engines_that_started() {
        let factory = Arc::new(ScriptedFactory::default().fail_init_on(1));
        let err = WorkerPool::spawn(
            Arc::clone(&factory),
            &OcrLanguage::default(),
            3,
            Arc::new(pdf_with_pages(3)),
        )
        .await
        .err()
        .unwrap();

        assert!(matches!(err, PdfwerkError::EngineInit(_)));
        assert_eq!(factory.stats().created(), 2);
        assert_eq!(factory.stats().terminated(), 2);
    }

    #[tokio::test]
    async fn dropping_the_pool_terminates_workers() {
        let factory = Arc::new(ScriptedFactory::default());
        let pool = WorkerPool::spawn(
            Arc::clone(&factory),
            &OcrLanguage::default(),
            2,
            Arc::new(pdf_with_pages(2)),
        )
        .await
        .unwrap();
        drop(pool);
        assert_eq!(factory.stats().terminated(), 2);
    }

    #[tokio::test]
    async fn panicking_page_is_a_page_failure_and_worker_survives() {
        let factory = Arc::new(ScriptedFactory::default().panic_on_page(1));
        let pool = WorkerPool::spawn(
            Arc::clone(&factory),
            &OcrLanguage::default(),
            1,
            Arc::new(pdf_with_pages(2)),
        )
        .await
        .unwrap();
        let worker = pool.worker(0).unwrap();

        let first = {
            let worker = Arc::clone(&worker);
            tokio::task::spawn_blocking(move || run_page(&worker, 1, 0.25))
                .await
                .unwrap()
        };
        assert!(matches!(first, Err(PdfwerkError::PageProcessing { page: 1, .. })));

        let second = tokio::task::spawn_blocking(move || run_page(&worker, 2, 0.25))
            .await
            .unwrap();
        assert_eq!(second.unwrap(), "text of page 2");

        pool.release().await;
        assert_eq!(factory.stats().terminated(), 1);
    }
}
