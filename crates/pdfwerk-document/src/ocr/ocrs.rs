// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust OCR engine using the `ocrs` crate, with neural network models
// executed via `rten`. Only available with the `ocr` feature.
//
// The engine needs two model files in one directory:
//
// - `text-detection.rten` — locates text regions in the image.
// - `text-recognition.rten` — decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads them to `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`), which is the default location.
//
// The published models read Latin script only, so any other language is
// rejected at initialization.

use std::path::{Path, PathBuf};

use ocrs::{ImageSource, OcrEngine as RawOcrsEngine, OcrEngineParams};
use pdfwerk_core::config::OcrSettings;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::OcrLanguage;
use rten::Model;
use tracing::{debug, info, instrument};

use crate::ocr::engine::{EngineFactory, RecognitionEngine};
use crate::render::PageImage;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Language codes the bundled models can read.
const SUPPORTED_LANGUAGES: [&str; 2] = ["eng", "latin"];

fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Model file locations.
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl From<&OcrSettings> for OcrsConfig {
    fn from(settings: &OcrSettings) -> Self {
        match &settings.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::default(),
        }
    }
}

impl OcrsConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(PdfwerkError::EngineInit(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Creates one [`OcrsEngine`] per worker; each loads its own model pair.
#[derive(Debug, Clone, Default)]
pub struct OcrsFactory {
    config: OcrsConfig,
}

impl OcrsFactory {
    pub fn new(config: OcrsConfig) -> Self {
        Self { config }
    }
}

impl EngineFactory for OcrsFactory {
    type Engine = OcrsEngine;

    fn create(&self, language: &OcrLanguage) -> Result<OcrsEngine> {
        if let Some(unsupported) = language
            .components()
            .find(|code| !SUPPORTED_LANGUAGES.contains(code))
        {
            return Err(PdfwerkError::EngineInit(format!(
                "the ocrs engine cannot read `{unsupported}`; use the tesseract engine for it"
            )));
        }
        OcrsEngine::new(load_models(&self.config)?)
    }
}

#[instrument(skip_all, fields(
    detection = %config.detection_model_path.display(),
    recognition = %config.recognition_model_path.display(),
))]
fn load_models(config: &OcrsConfig) -> Result<(Model, Model)> {
    config.validate()?;

    info!("Loading OCR detection model");
    let detection = Model::load_file(&config.detection_model_path).map_err(|err| {
        PdfwerkError::EngineInit(format!(
            "failed to load detection model from {}: {}",
            config.detection_model_path.display(),
            err
        ))
    })?;

    info!("Loading OCR recognition model");
    let recognition = Model::load_file(&config.recognition_model_path).map_err(|err| {
        PdfwerkError::EngineInit(format!(
            "failed to load recognition model from {}: {}",
            config.recognition_model_path.display(),
            err
        ))
    })?;

    Ok((detection, recognition))
}

pub struct OcrsEngine {
    engine: RawOcrsEngine,
}

impl OcrsEngine {
    fn new((detection, recognition): (Model, Model)) -> Result<Self> {
        let engine = RawOcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection),
            recognition_model: Some(recognition),
            ..Default::default()
        })
        .map_err(|err| {
            PdfwerkError::EngineInit(format!("failed to initialise OCR engine: {}", err))
        })?;
        Ok(Self { engine })
    }
}

impl RecognitionEngine for OcrsEngine {
    #[instrument(skip_all, fields(
        page = page.page_number,
        width = page.width(),
        height = page.height(),
    ))]
    fn recognize(&mut self, page: &PageImage) -> Result<String> {
        // ocrs expects RGB8.
        let rgb = image::DynamicImage::ImageRgba8(page.image.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            PdfwerkError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| PdfwerkError::OcrError(format!("OCR preprocessing failed: {}", err)))?;
        let text = self.engine.get_text(&input).map_err(|err| {
            PdfwerkError::OcrError(format!("OCR text recognition failed: {}", err))
        })?;

        debug!(lines = text.lines().count(), "ocrs recognized page");
        Ok(text)
    }
}
