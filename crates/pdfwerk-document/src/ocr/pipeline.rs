// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR pipeline — one job from document bytes to transcript.
//
// Steps: count pages, start the worker pool, dispatch pages, release the
// pool, reassemble. Only an engine start-up failure (or an unreadable
// document) fails the job; per-page failures end up as failure markers.

use std::sync::Arc;

use pdfwerk_core::config::OcrSettings;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::i18n::Locale;
use pdfwerk_core::types::{DispatchStrategy, JobId, OcrLanguage, PageResult};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::ocr::dispatch::dispatch;
use crate::ocr::engine::EngineFactory;
use crate::ocr::pool::WorkerPool;
use crate::ocr::progress::ProgressReporter;
use crate::ocr::reassemble::{Transcript, assemble_transcript};
use crate::ocr::results::PageResults;
use crate::render::Rasterizer;

/// Default file name offered for the transcript.
pub const DEFAULT_TRANSCRIPT_NAME: &str = "ocr_result.txt";

/// Parameters for one OCR job.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    pub language: OcrLanguage,
    /// Workers the caller would like.
    pub workers: usize,
    /// Hard ceiling from configuration.
    pub max_workers: usize,
    pub render_scale: f32,
    pub strategy: DispatchStrategy,
    /// Language of page banners and failure markers.
    pub locale: Locale,
}

impl OcrOptions {
    /// Options from saved settings; the caller asks for as many workers as
    /// the configuration allows.
    pub fn from_settings(settings: &OcrSettings, locale: Locale) -> Self {
        Self {
            language: settings.language.clone(),
            workers: settings.max_workers,
            max_workers: settings.max_workers,
            render_scale: settings.render_scale,
            strategy: settings.strategy,
            locale,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.workers == 0 || self.max_workers == 0 {
            return Err(PdfwerkError::InputValidation(
                "at least one OCR worker is required".into(),
            ));
        }
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(PdfwerkError::InputValidation(format!(
                "render scale must be positive, got {}",
                self.render_scale
            )));
        }
        Ok(())
    }
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self::from_settings(&OcrSettings::default(), Locale::default())
    }
}

/// Everything a finished job produced.
#[derive(Debug, Clone, Serialize)]
pub struct OcrOutcome {
    pub job_id: JobId,
    pub worker_count: usize,
    /// One entry per page, in page order.
    pub results: Vec<PageResult>,
    pub transcript: Transcript,
}

impl OcrOutcome {
    pub fn failed_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.results
            .iter()
            .filter(|result| result.failed)
            .map(|result| result.page_number)
    }
}

/// Runs OCR jobs with engines from `F`.
pub struct OcrPipeline<F: EngineFactory> {
    factory: Arc<F>,
    options: OcrOptions,
}

impl<F: EngineFactory> OcrPipeline<F> {
    pub fn new(factory: F, options: OcrOptions) -> Self {
        Self {
            factory: Arc::new(factory),
            options,
        }
    }

    /// Recognize every page of `pdf`, reporting per-page progress to
    /// `progress`.
    #[instrument(skip_all, fields(
        language = %self.options.language,
        strategy = ?self.options.strategy,
    ))]
    pub async fn run(&self, pdf: Arc<Vec<u8>>, progress: &ProgressReporter) -> Result<OcrOutcome> {
        self.options.validate()?;
        let job_id = JobId::new();

        let total = {
            let pdf = Arc::clone(&pdf);
            tokio::task::spawn_blocking(move || {
                Rasterizer::from_bytes(pdf).map(|rasterizer| rasterizer.page_count())
            })
            .await
            .map_err(|err| PdfwerkError::PdfError(format!("page count task failed: {err}")))??
        };
        if total == 0 {
            return Err(PdfwerkError::InputValidation("the document has no pages".into()));
        }

        let size = WorkerPool::<F::Engine>::planned_size(
            self.options.workers,
            self.options.max_workers,
            total,
        );
        info!(%job_id, pages = total, workers = size, "Starting OCR job");
        progress.begin(total);

        let pool =
            WorkerPool::spawn(Arc::clone(&self.factory), &self.options.language, size, pdf).await?;

        let labels = self.options.locale.labels();
        let mut results = PageResults::new(total, labels.failure_marker);
        dispatch(
            &pool,
            self.options.strategy,
            total,
            self.options.render_scale,
            &mut results,
            progress,
        )
        .await;
        let worker_count = pool.size();
        pool.release().await;

        let results = results.into_vec();
        let failed = results.iter().filter(|result| result.failed).count();
        if failed > 0 {
            warn!(%job_id, failed, "Some pages could not be recognized");
        }
        let transcript = assemble_transcript(&results, labels);
        info!(%job_id, empty = transcript.is_empty(), "OCR job finished");

        Ok(OcrOutcome {
            job_id,
            worker_count,
            results,
            transcript,
        })
    }
}
