// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation runners for merge, split, convert, compress and OCR.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::i18n::Labels;
use pdfwerk_core::types::{EngineKind, OperationKind, PageRange, PageSelection, Quality};
use pdfwerk_core::AppConfig;
use pdfwerk_document::ocr::{EngineFactory, OcrOptions, OcrOutcome, OcrPipeline, ProgressReporter};
use pdfwerk_document::ocr::{TesseractConfig, TesseractFactory};
use pdfwerk_document::{ConvertOptions, ImageArchive, PdfReader};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::state::ControlPanel;

pub const MERGED_NAME: &str = "merged.pdf";
pub const COMPRESSED_NAME: &str = "compressed.pdf";

/// Default output name for a split, e.g. `split_2-5.pdf`.
pub fn split_name(range: PageRange) -> String {
    format!("split_{}-{}.pdf", range.start, range.end)
}

/// Shared services for every command. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppServices {
    config: Arc<AppConfig>,
    panel: ControlPanel,
}

impl AppServices {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            panel: ControlPanel::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn labels(&self) -> &'static Labels {
        self.config.locale.labels()
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    /// Run `work` as operation `kind`, refusing to start while another
    /// operation of the same kind is running.
    async fn guarded<T, W>(&self, kind: OperationKind, work: W) -> Result<T>
    where
        W: Future<Output = Result<T>>,
    {
        let guard = self.panel.begin(kind, self.labels().busy)?;
        info!(?kind, job_id = %guard.job_id(), "Operation running");
        match work.await {
            Ok(value) => {
                guard.succeed();
                Ok(value)
            }
            Err(err) => {
                guard.fail(err.to_string());
                Err(err)
            }
        }
    }

    // -- Structure -----------------------------------------------------------

    /// Concatenate the PDFs at `inputs`, in order.
    #[instrument(skip(self), fields(files = inputs.len()))]
    pub async fn merge(&self, inputs: &[PathBuf]) -> Result<Vec<u8>> {
        self.guarded(OperationKind::Merge, async {
            if inputs.len() < 2 {
                return Err(PdfwerkError::InputValidation(format!(
                    "merging needs at least two files, got {}",
                    inputs.len()
                )));
            }
            let mut documents = Vec::with_capacity(inputs.len());
            for path in inputs {
                documents.push(read_input(path).await?);
            }
            blocking(move || PdfReader::merge_bytes(&documents)).await
        })
        .await
    }

    /// Extract pages `range` of `input` into a new PDF.
    #[instrument(skip(self))]
    pub async fn split(&self, input: &Path, range: PageRange) -> Result<Vec<u8>> {
        self.guarded(OperationKind::Split, async {
            let data = read_input(input).await?;
            blocking(move || PdfReader::from_bytes(&data)?.split(range)).await
        })
        .await
    }

    /// Number of pages in `input`.
    pub async fn page_count(&self, input: &Path) -> Result<u32> {
        let data = read_input(input).await?;
        blocking(move || PdfReader::from_bytes(&data).map(|reader| reader.page_count())).await
    }

    // -- Rendering -----------------------------------------------------------

    #[instrument(skip(self, options), fields(format = ?options.format))]
    pub async fn convert(
        &self,
        input: &Path,
        selection: PageSelection,
        options: ConvertOptions,
    ) -> Result<ImageArchive> {
        self.guarded(OperationKind::Convert, async {
            // Nothing is read or rendered for an empty selection.
            if selection.is_empty() {
                return Err(PdfwerkError::InputValidation(
                    "select at least one page to convert".into(),
                ));
            }
            let data = Arc::new(read_input(input).await?);
            blocking(move || pdfwerk_document::convert_to_images(data, &selection, &options)).await
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn compress(&self, input: &Path, quality: Quality) -> Result<Vec<u8>> {
        self.guarded(OperationKind::Compress, async {
            let data = Arc::new(read_input(input).await?);
            blocking(move || pdfwerk_document::compress_pdf(data, quality)).await
        })
        .await
    }

    // -- OCR -----------------------------------------------------------------

    /// Recognize every page of `input` with `engine`.
    #[instrument(skip(self, options, progress), fields(language = %options.language))]
    pub async fn ocr(
        &self,
        input: &Path,
        engine: EngineKind,
        options: OcrOptions,
        progress: &ProgressReporter,
    ) -> Result<OcrOutcome> {
        self.guarded(OperationKind::Ocr, async {
            let data = Arc::new(read_input(input).await?);
            match engine {
                EngineKind::Tesseract => {
                    let factory = TesseractFactory::new(TesseractConfig::from(&self.config.ocr));
                    run_pipeline(factory, options, data, progress).await
                }
                EngineKind::Ocrs => self.run_ocrs(options, data, progress).await,
            }
        })
        .await
    }

    #[cfg(feature = "ocr")]
    async fn run_ocrs(
        &self,
        options: OcrOptions,
        data: Arc<Vec<u8>>,
        progress: &ProgressReporter,
    ) -> Result<OcrOutcome> {
        use pdfwerk_document::ocr::{OcrsConfig, OcrsFactory};

        let config = OcrsConfig::from(&self.config.ocr);
        config.validate()?;
        run_pipeline(OcrsFactory::new(config), options, data, progress).await
    }

    #[cfg(not(feature = "ocr"))]
    async fn run_ocrs(
        &self,
        _options: OcrOptions,
        _data: Arc<Vec<u8>>,
        _progress: &ProgressReporter,
    ) -> Result<OcrOutcome> {
        Err(PdfwerkError::EngineInit(
            "this build has no ocrs engine; rebuild with `--features ocr`".into(),
        ))
    }
}

async fn run_pipeline<F: EngineFactory>(
    factory: F,
    options: OcrOptions,
    data: Arc<Vec<u8>>,
    progress: &ProgressReporter,
) -> Result<OcrOutcome> {
    OcrPipeline::new(factory, options).run(data, progress).await
}

/// Read an input file. A missing file is the user's mistake, not an I/O fault.
async fn read_input(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(
            PdfwerkError::InputValidation(format!("{} does not exist", path.display())),
        ),
        Err(err) => Err(PdfwerkError::Io(err)),
    }
}

/// Write an output file, creating its parent directory.
///
/// The bytes go to a temporary file beside `path` that is renamed into place
/// once complete, so a failed write never leaves a truncated output behind.
pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let target = path.to_path_buf();
    let data = bytes.to_vec();
    blocking(move || write_atomically(&target, &data)).await?;
    info!(path = %path.display(), bytes = bytes.len(), "Saved");
    Ok(())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let export = |err: std::io::Error| {
        PdfwerkError::Export(format!("cannot write {}: {}", path.display(), err))
    };
    let parent = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(export)?;

    let mut staged = NamedTempFile::new_in(&parent).map_err(export)?;
    staged.write_all(bytes).map_err(export)?;
    staged.as_file().sync_all().map_err(export)?;
    staged.persist(path).map_err(|err| export(err.error))?;
    Ok(())
}

async fn blocking<T, W>(work: W) -> Result<T>
where
    T: Send + 'static,
    W: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PdfwerkError::Io(std::io::Error::other(err)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use pdfwerk_core::types::{ImageFormat, OperationStatus};
    use pdfwerk_document::{ImageProcessor, PdfWriter, Rasterizer};

    fn sample_pdf(pages: u32) -> Vec<u8> {
        let jpeg = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(20, 20)))
            .to_jpeg_bytes(Quality::from_percent(80).unwrap())
            .unwrap();
        let mut writer = PdfWriter::new();
        for _ in 0..pages {
            writer.add_jpeg_page(jpeg.clone(), (20, 20), (100.0, 100.0)).unwrap();
        }
        writer.finish().unwrap()
    }

    fn write_sample(dir: &Path, name: &str, pages: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, sample_pdf(pages)).unwrap();
        path
    }

    #[tokio::test]
    async fn merge_concatenates_and_settles_status() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_sample(dir.path(), "a.pdf", 2);
        let b = write_sample(dir.path(), "b.pdf", 1);
        let services = AppServices::new(AppConfig::default());

        let merged = services.merge(&[a, b]).await.unwrap();
        assert_eq!(PdfReader::from_bytes(&merged).unwrap().page_count(), 3);
        assert!(matches!(
            services.panel().status(OperationKind::Merge),
            OperationStatus::Succeeded { .. }
        ));
    }

    #[tokio::test]
    async fn merge_of_one_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_sample(dir.path(), "a.pdf", 2);
        let services = AppServices::new(AppConfig::default());

        let err = services.merge(&[a]).await.err().unwrap();
        assert!(matches!(err, PdfwerkError::InputValidation(_)));
        assert!(services.panel().is_enabled(OperationKind::Merge));
    }

    #[tokio::test]
    async fn split_writes_requested_range() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample(dir.path(), "in.pdf", 4);
        let services = AppServices::new(AppConfig::default());

        let range = PageRange::new(2, 3);
        let bytes = services.split(&input, range).await.unwrap();
        assert_eq!(PdfReader::from_bytes(&bytes).unwrap().page_count(), 2);
        assert_eq!(split_name(range), "split_2-3.pdf");
        assert_eq!(services.page_count(&input).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn missing_input_is_a_validation_error() {
        let services = AppServices::new(AppConfig::default());
        let err = services
            .compress(Path::new("/nonexistent/input.pdf"), Quality::from_percent(50).unwrap())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PdfwerkError::InputValidation(_)));
    }

    #[tokio::test]
    async fn empty_selection_fails_before_reading() {
        let services = AppServices::new(AppConfig::default());
        let options = ConvertOptions {
            format: ImageFormat::Webp,
            ..ConvertOptions::default()
        };
        // The path does not exist; the selection check must come first.
        let err = services
            .convert(Path::new("/nonexistent/input.pdf"), PageSelection::none(), options)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PdfwerkError::InputValidation(ref msg) if msg.contains("select")));
    }

    #[tokio::test]
    async fn convert_and_compress_keep_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample(dir.path(), "in.pdf", 2);
        let services = AppServices::new(AppConfig::default());

        let options = ConvertOptions {
            scale: 0.5,
            ..ConvertOptions::default()
        };
        let archive = services.convert(&input, PageSelection::All, options).await.unwrap();
        assert_eq!(archive.entries, vec!["page_1.png", "page_2.png"]);

        let compressed = services
            .compress(&input, Quality::from_percent(50).unwrap())
            .await
            .unwrap();
        assert_eq!(PdfReader::from_bytes(&compressed).unwrap().page_count(), 2);
        let _ = Rasterizer::from_bytes(Arc::new(compressed)).unwrap();
    }

    #[tokio::test]
    async fn write_output_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.pdf");
        write_output(&path, b"data").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        write_output(&path, b"replaced").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"replaced");
    }

    #[tokio::test]
    async fn failed_write_is_an_export_error_and_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // A directory already occupies the target name, so the final rename fails.
        let target = dir.path().join("merged.pdf");
        std::fs::create_dir(&target).unwrap();

        let err = write_output(&target, b"%PDF-1.5 partial").await.err().unwrap();
        assert!(matches!(err, PdfwerkError::Export(_)));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("merged.pdf")]);
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn unwritable_parent_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let err = write_output(&blocker.join("out.pdf"), b"data").await.err().unwrap();
        assert!(matches!(err, PdfwerkError::Export(_)));
    }
}
