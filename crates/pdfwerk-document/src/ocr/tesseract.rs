// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract engine — wraps the `tesseract` command-line tool.
//
// Initialization checks that the binary runs and that every component of the
// requested language has installed traineddata. Each page is written to a
// temporary PNG and recognized with the LSTM engine in automatic page
// segmentation mode.

use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use pdfwerk_core::config::OcrSettings;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::OcrLanguage;
use tracing::{debug, info, instrument};

use crate::ocr::engine::{EngineFactory, RecognitionEngine};
use crate::render::PageImage;

const DEFAULT_BINARY: &str = "tesseract";

/// Where to find tesseract and its language data.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    pub binary: PathBuf,
    /// Exported as `TESSDATA_PREFIX` when set.
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            tessdata_dir: None,
        }
    }
}

impl From<&OcrSettings> for TesseractConfig {
    fn from(settings: &OcrSettings) -> Self {
        Self {
            binary: settings
                .tesseract_binary
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY)),
            tessdata_dir: settings.tessdata_dir.clone(),
        }
    }
}

impl TesseractConfig {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = &self.tessdata_dir {
            cmd.env("TESSDATA_PREFIX", dir);
        }
        cmd
    }
}

/// Creates one [`TesseractEngine`] per worker.
#[derive(Debug, Clone, Default)]
pub struct TesseractFactory {
    config: TesseractConfig,
}

impl TesseractFactory {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }
}

impl EngineFactory for TesseractFactory {
    type Engine = TesseractEngine;

    fn create(&self, language: &OcrLanguage) -> Result<TesseractEngine> {
        TesseractEngine::new(self.config.clone(), language.clone())
    }
}

pub struct TesseractEngine {
    config: TesseractConfig,
    language: OcrLanguage,
}

impl TesseractEngine {
    /// Verify the binary and language data, then return a ready engine.
    #[instrument(skip(config), fields(binary = %config.binary.display()))]
    pub fn new(config: TesseractConfig, language: OcrLanguage) -> Result<Self> {
        let version = tesseract_version(&config)?;
        let installed = installed_languages(&config)?;
        if let Some(missing) = language
            .components()
            .find(|code| !installed.iter().any(|lang| lang == code))
        {
            return Err(PdfwerkError::EngineInit(format!(
                "language `{missing}` is not installed for tesseract {version}"
            )));
        }

        info!(%version, %language, "Tesseract ready");
        Ok(Self { config, language })
    }
}

impl RecognitionEngine for TesseractEngine {
    fn recognize(&mut self, page: &PageImage) -> Result<String> {
        let start = Instant::now();

        // Removed when `input` drops, whatever the outcome.
        let input = tempfile::Builder::new()
            .prefix("pdfwerk-page-")
            .suffix(".png")
            .tempfile()?;
        page.image
            .save_with_format(input.path(), image::ImageFormat::Png)
            .map_err(|err| {
                PdfwerkError::ImageError(format!("cannot write page image: {}", err))
            })?;

        let output = self
            .config
            .command()
            .arg(input.path())
            .arg("stdout")
            .args(["-l", self.language.as_str()])
            .args(["--oem", "1", "--psm", "1"])
            .args(["-c", "preserve_interword_spaces=0"])
            .args(["-c", "textord_tabfind_vertical_text=1"])
            .args(["-c", "language_model_ngram_on=1"])
            .output()
            .map_err(|err| PdfwerkError::OcrError(format!("cannot run tesseract: {}", err)))?;

        if !output.status.success() {
            return Err(PdfwerkError::OcrError(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            page = page.page_number,
            chars = text.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tesseract recognized page"
        );
        Ok(text)
    }
}

fn tesseract_version(config: &TesseractConfig) -> Result<String> {
    let output = config.command().arg("--version").output().map_err(|err| {
        PdfwerkError::EngineInit(format!(
            "cannot run {}: {}",
            config.binary.display(),
            err
        ))
    })?;
    if !output.status.success() {
        return Err(PdfwerkError::EngineInit(format!(
            "{} --version exited with {}",
            config.binary.display(),
            output.status
        )));
    }
    // Older releases print the version on stderr.
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(parse_version(&combined).unwrap_or_else(|| "unknown".to_string()))
}

fn installed_languages(config: &TesseractConfig) -> Result<Vec<String>> {
    let output = config.command().arg("--list-langs").output().map_err(|err| {
        PdfwerkError::EngineInit(format!("cannot list tesseract languages: {}", err))
    })?;
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(parse_language_list(&combined))
}

fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.trim_start().starts_with("tesseract"))
        .and_then(|line| line.split_whitespace().nth(1))
        .map(|version| version.trim_start_matches('v').to_string())
}

/// Language codes from `tesseract --list-langs` output.
fn parse_language_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.starts_with("List of available languages"))
        .skip(1)
        .filter(|line| !line.is_empty() && !line.contains(':'))
        .map(str::to_string)
        .collect()
}
