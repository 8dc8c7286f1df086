// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PdfwerkError, Result};
use crate::i18n::Locale;
use crate::types::{DispatchStrategy, EngineKind, ImageFormat, OcrLanguage};

/// Persistent application settings. Every field has a default so a partial
/// JSON file is accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Display language for labels, messages and transcript banners.
    pub locale: Locale,
    pub ocr: OcrSettings,
    pub convert: ConvertSettings,
    pub compress: CompressSettings,
}

/// OCR job defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub language: OcrLanguage,
    /// Upper bound on concurrently running recognition workers.
    pub max_workers: usize,
    /// Scale applied to the page's intrinsic size before recognition.
    pub render_scale: f32,
    pub engine: EngineKind,
    pub strategy: DispatchStrategy,
    /// `tesseract` executable; looked up on `PATH` when unset.
    pub tesseract_binary: Option<PathBuf>,
    /// Exported as `TESSDATA_PREFIX` for the tesseract process.
    pub tessdata_dir: Option<PathBuf>,
    /// Directory holding the ocrs `.rten` models.
    pub model_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: OcrLanguage::default(),
            max_workers: 4,
            render_scale: 4.0,
            engine: EngineKind::Tesseract,
            strategy: DispatchStrategy::PageGroups,
            tesseract_binary: None,
            tessdata_dir: None,
            model_dir: None,
        }
    }
}

/// Convert-to-image defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    pub format: ImageFormat,
    pub render_scale: f32,
    /// Deflate level for the output archive.
    pub compression_level: i64,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            render_scale: 4.0,
            compression_level: 3,
        }
    }
}

/// Compress defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressSettings {
    /// JPEG quality percentage, 1–100.
    pub quality_percent: u32,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            quality_percent: 50,
        }
    }
}

const CONFIG_FILE: &str = "config.json";

impl AppConfig {
    /// Read a config file. A missing file is an error here; callers that want
    /// to fall back to defaults use [`AppConfig::load_or_default`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| {
            PdfwerkError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|err| {
            PdfwerkError::Config(format!("{} is not valid: {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the config at `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values no operation can run with.
    pub fn validate(&self) -> Result<()> {
        if self.ocr.max_workers == 0 {
            return Err(PdfwerkError::Config("ocr.max_workers must be at least 1".into()));
        }
        if !(self.ocr.render_scale.is_finite() && self.ocr.render_scale > 0.0) {
            return Err(PdfwerkError::Config("ocr.render_scale must be positive".into()));
        }
        if !(self.convert.render_scale.is_finite() && self.convert.render_scale > 0.0) {
            return Err(PdfwerkError::Config(
                "convert.render_scale must be positive".into(),
            ));
        }
        if !(0..=9).contains(&self.convert.compression_level) {
            return Err(PdfwerkError::Config(
                "convert.compression_level must be between 0 and 9".into(),
            ));
        }
        if !(1..=100).contains(&self.compress.quality_percent) {
            return Err(PdfwerkError::Config(
                "compress.quality_percent must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

/// Default config location: `$XDG_CONFIG_HOME/pdfwerk/config.json`, falling
/// back to `~/.config/pdfwerk/config.json`.
pub fn default_config_path() -> PathBuf {
    config_base().join("pdfwerk").join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.locale, Locale::Zh);
        assert_eq!(config.ocr.language.as_str(), "chi_sim");
        assert_eq!(config.ocr.max_workers, 4);
        assert_eq!(config.ocr.render_scale, 4.0);
        assert_eq!(config.convert.format, ImageFormat::Png);
        assert_eq!(config.convert.compression_level, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "locale": "en", "ocr": { "max_workers": 2 } }"#).unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.ocr.max_workers, 2);
        assert_eq!(config.ocr.language.as_str(), "chi_sim");
        assert_eq!(config.compress.quality_percent, 50);
    }

    #[test]
    fn invalid_language_in_json_is_rejected() {
        let parsed = serde_json::from_str::<AppConfig>(r#"{ "ocr": { "language": "" } }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = AppConfig::default();
        config.ocr.max_workers = 0;
        assert!(matches!(config.validate(), Err(PdfwerkError::Config(_))));
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let dir = std::env::temp_dir().join(format!("pdfwerk-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        let mut config = AppConfig::default();
        config.ocr.strategy = DispatchStrategy::WorkQueue;
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.ocr.strategy, DispatchStrategy::WorkQueue);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default("/nonexistent/pdfwerk/config.json").unwrap();
        assert_eq!(config.ocr.max_workers, 4);
    }
}
