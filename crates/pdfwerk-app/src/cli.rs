// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface. Flags left unset fall back to the loaded config.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdfwerk_core::config::OcrSettings;
use pdfwerk_core::i18n::Locale;
use pdfwerk_core::types::{DispatchStrategy, EngineKind, ImageFormat, OcrLanguage, PageSelection};
use pdfwerk_core::AppConfig;
use pdfwerk_document::{ConvertOptions, OcrOptions};

#[derive(Debug, Parser)]
#[command(
    name = "pdfwerk",
    version,
    about = "Merge, split, convert, compress and OCR PDFs locally"
)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/pdfwerk/config.json).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Display language: zh or en.
    #[arg(long, global = true)]
    pub locale: Option<Locale>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Concatenate PDFs in the order given.
    Merge {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract an inclusive, 1-based page range.
    Split {
        input: PathBuf,
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render pages to images and pack them into a ZIP archive.
    Convert {
        input: PathBuf,
        /// Pages such as `1,3-5`, or `all`.
        #[arg(long, default_value = "all")]
        pages: PageSelection,
        #[arg(long)]
        format: Option<ImageFormat>,
        #[arg(long)]
        scale: Option<f32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-render every page as a JPEG.
    Compress {
        input: PathBuf,
        /// JPEG quality, 1-100.
        #[arg(long)]
        quality: Option<u32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Recognize text on every page.
    Ocr {
        input: PathBuf,
        /// Tesseract language code, `+`-joined for several.
        #[arg(long)]
        language: Option<OcrLanguage>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        engine: Option<EngineKind>,
        /// `groups` or `queue`.
        #[arg(long)]
        strategy: Option<DispatchStrategy>,
        #[arg(long)]
        scale: Option<f32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write per-page results as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print the page count.
    Pages { input: PathBuf },
}

/// Convert options from config, overridden by flags.
pub fn convert_options(
    config: &AppConfig,
    format: Option<ImageFormat>,
    scale: Option<f32>,
) -> ConvertOptions {
    let mut options = ConvertOptions::from(&config.convert);
    if let Some(format) = format {
        options.format = format;
    }
    if let Some(scale) = scale {
        options.scale = scale;
    }
    options
}

/// OCR flags that override the configured defaults.
#[derive(Debug, Default)]
pub struct OcrOverrides {
    pub language: Option<OcrLanguage>,
    pub workers: Option<usize>,
    pub engine: Option<EngineKind>,
    pub strategy: Option<DispatchStrategy>,
    pub scale: Option<f32>,
}

impl OcrOverrides {
    /// Pipeline options and the engine to use. The configured worker
    /// ceiling always applies, whatever `--workers` asks for.
    pub fn resolve(self, settings: &OcrSettings, locale: Locale) -> (OcrOptions, EngineKind) {
        let mut options = OcrOptions::from_settings(settings, locale);
        if let Some(language) = self.language {
            options.language = language;
        }
        if let Some(workers) = self.workers {
            options.workers = workers;
        }
        if let Some(strategy) = self.strategy {
            options.strategy = strategy;
        }
        if let Some(scale) = self.scale {
            options.render_scale = scale;
        }
        (options, self.engine.unwrap_or(settings.engine))
    }
}
