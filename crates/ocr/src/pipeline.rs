use std::path::{Path, PathBuf};
use thiserror::Error;

use docket_core::{AccuracyReport, DocumentResult, PipelineConfig};
use docket_storage::{ExtractionRecord, StorageError};

use crate::adapter::OcrAdapter;
use crate::extract::extract_fields;
use crate::preprocess::{self, PreprocessError};
use crate::types::Document;

/// Raster formats picked up from the input directory.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input directory '{0}' does not exist")]
    InputDirMissing(PathBuf),
    #[error("No images found in '{0}'")]
    NoInputImages(PathBuf),
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Everything a batch run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<DocumentResult>,
    pub report: AccuracyReport,
}

/// Orchestrates: load → OCR raw → preprocess → OCR clean → extract → persist.
pub struct DocumentPipeline<'a> {
    ocr: &'a OcrAdapter,
    config: &'a PipelineConfig,
}

impl<'a> DocumentPipeline<'a> {
    /// Rejects a bad preprocessing config before any document is touched.
    pub fn new(ocr: &'a OcrAdapter, config: &'a PipelineConfig) -> Result<Self, PipelineError> {
        preprocess::validate(&config.preprocess)?;
        Ok(Self { ocr, config })
    }

    /// Runs one file end to end. A file that cannot be loaded yields a
    /// zero-count result; nothing here aborts the batch.
    pub fn process_document(&self, path: &Path) -> DocumentResult {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!("Processing: {filename}");

        let doc = match Document::open(path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("{e}");
                return DocumentResult::empty(filename);
            }
        };

        let text_before = self.ocr.extract_text(&doc);

        let binary = match preprocess::preprocess(&doc, &self.config.preprocess) {
            Ok(binary) => Some(binary),
            Err(e) => {
                tracing::error!("Preprocessing {filename} failed: {e}");
                None
            }
        };
        let text_after = binary
            .as_ref()
            .map(|b| self.ocr.extract_text(b))
            .unwrap_or_default();

        let fields = extract_fields(&text_after);

        if let Some(binary) = &binary {
            if let Err(e) = docket_storage::save_preprocessed_image(
                &self.config.output_image_dir,
                path,
                binary.as_gray(),
            ) {
                tracing::error!("{e}");
            }
        }
        let record = ExtractionRecord::new(&filename, &text_after, &fields);
        if let Err(e) = docket_storage::save_record(&self.config.output_json_dir, path, &record) {
            tracing::error!("{e}");
        }

        let result = DocumentResult::new(filename, text_before, text_after, fields);
        let (dates, amounts, emails) = result.fields.counts();
        tracing::info!(
            "{}: {} -> {} chars ({:+.2}%), {dates} dates, {amounts} amounts, {emails} emails",
            result.filename,
            result.char_count_before,
            result.char_count_after,
            result.improvement_percent()
        );
        result
    }

    /// Processes every image in the input directory, then writes the report.
    pub fn run(&self) -> Result<BatchOutcome, PipelineError> {
        let inputs = list_images(&self.config.input_dir)?;
        if inputs.is_empty() {
            return Err(PipelineError::NoInputImages(self.config.input_dir.clone()));
        }
        docket_storage::ensure_dir(&self.config.output_image_dir)?;
        docket_storage::ensure_dir(&self.config.output_json_dir)?;

        tracing::info!(
            "Found {} document(s) in {}",
            inputs.len(),
            self.config.input_dir.display()
        );
        let results: Vec<DocumentResult> =
            inputs.iter().map(|p| self.process_document(p)).collect();

        let report = AccuracyReport::generate(&results);
        match docket_storage::write_report(&self.config.report_path, &report.render()) {
            Ok(()) => tracing::info!("Report written to {}", self.config.report_path.display()),
            Err(e) => tracing::error!("{e}"),
        }
        tracing::info!(
            "Batch complete: {} document(s), {} -> {} chars ({:+.2}%)",
            results.len(),
            report.total_before,
            report.total_after,
            report.improvement_percent
        );

        Ok(BatchOutcome { results, report })
    }
}

/// Image files directly under `dir`, in directory listing order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::InputDirMissing(dir.to_path_buf()));
    }
    let io_err = |source| PipelineError::Io { path: dir.to_path_buf(), source };

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{MockRecognizer, OcrBackend, OcrError};
    use docket_core::{KernelSize, PreprocessConfig};
    use image::{ColorType, Rgb, RgbImage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Tells the raw colour page and the binarized page apart.
    struct ColorAwareRecognizer;

    impl OcrBackend for ColorAwareRecognizer {
        fn name(&self) -> &'static str {
            "color-aware"
        }

        fn recognize(&self, png_bytes: &[u8]) -> Result<String, OcrError> {
            let img = image::load_from_memory(png_bytes)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            Ok(match img.color() {
                ColorType::L8 => "Invoice Date: 15/01/2024\nAmount: $500.50\nEmail: a@b.com",
                _ => "Inv0ice",
            }
            .to_string())
        }
    }

    /// Records whether the preprocessed PNG already existed when the clean
    /// page was recognized.
    struct ArtifactWatcher {
        artifact: PathBuf,
        seen_before_clean_ocr: AtomicBool,
    }

    impl OcrBackend for ArtifactWatcher {
        fn name(&self) -> &'static str {
            "artifact-watcher"
        }

        fn recognize(&self, png_bytes: &[u8]) -> Result<String, OcrError> {
            let img = image::load_from_memory(png_bytes)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            if img.color() == ColorType::L8 && self.artifact.exists() {
                self.seen_before_clean_ocr.store(true, Ordering::SeqCst);
            }
            Ok("Total $5.50".to_string())
        }
    }

    fn write_page(path: &Path) {
        let mut img = RgbImage::from_pixel(24, 16, Rgb([240, 240, 240]));
        for x in 4..20 {
            img.put_pixel(x, 8, Rgb([10, 10, 10]));
        }
        img.save(path).unwrap();
    }

    fn config_in(root: &Path) -> PipelineConfig {
        PipelineConfig {
            input_dir: root.join("in"),
            output_image_dir: root.join("out_img"),
            output_json_dir: root.join("out_json"),
            report_path: root.join("report.txt"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn new_rejects_even_morph_kernel() {
        let adapter = OcrAdapter::new(Box::new(MockRecognizer::new("")));
        let config = PipelineConfig {
            preprocess: PreprocessConfig {
                morph_kernel: KernelSize::square(4),
                ..PreprocessConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            DocumentPipeline::new(&adapter, &config),
            Err(PipelineError::Preprocess(_))
        ));
    }

    #[test]
    fn process_document_compares_raw_and_clean_text() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        std::fs::create_dir_all(&config.output_image_dir).unwrap();
        std::fs::create_dir_all(&config.output_json_dir).unwrap();
        let page = config.input_dir.join("invoice_1.png");
        write_page(&page);

        let adapter = OcrAdapter::new(Box::new(ColorAwareRecognizer));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        let result = pipeline.process_document(&page);

        assert_eq!(result.filename, "invoice_1.png");
        assert_eq!(result.text_before, "Inv0ice");
        assert_eq!(result.char_count_before, 7);
        assert!(result.char_count_after > result.char_count_before);
        assert!(result.fields.dates.contains("15/01/2024"));
        assert!(result.fields.amounts.contains("$500.50"));
        assert_eq!(result.fields.emails, vec!["a@b.com"]);

        let png = config.output_image_dir.join("invoice_1_preprocessed.png");
        assert!(png.exists());
        let saved = image::open(&png).unwrap();
        assert_eq!(saved.color(), ColorType::L8);

        let record =
            docket_storage::load_record(&config.output_json_dir.join("invoice_1_extracted.json"))
                .unwrap();
        assert_eq!(record.filename, "invoice_1.png");
        assert_eq!(record.extracted_text, result.text_after);
        assert_eq!(record.dates, vec!["15/01/2024"]);
        assert_eq!(record.emails, vec!["a@b.com"]);
    }

    #[test]
    fn preprocessed_image_is_written_after_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        std::fs::create_dir_all(&config.output_image_dir).unwrap();
        std::fs::create_dir_all(&config.output_json_dir).unwrap();
        let page = config.input_dir.join("scan.png");
        write_page(&page);

        let artifact = config.output_image_dir.join("scan_preprocessed.png");
        let watcher = Arc::new(ArtifactWatcher {
            artifact: artifact.clone(),
            seen_before_clean_ocr: AtomicBool::new(false),
        });
        let adapter = OcrAdapter::new(Box::new(SharedBackend(Arc::clone(&watcher))));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        let result = pipeline.process_document(&page);

        assert!(result.fields.amounts.contains("$5.50"));
        assert!(artifact.exists());
        assert!(!watcher.seen_before_clean_ocr.load(Ordering::SeqCst));
    }

    struct SharedBackend(Arc<ArtifactWatcher>);

    impl OcrBackend for SharedBackend {
        fn name(&self) -> &'static str {
            self.0.name()
        }

        fn recognize(&self, png_bytes: &[u8]) -> Result<String, OcrError> {
            self.0.recognize(png_bytes)
        }
    }

    #[test]
    fn unreadable_file_gives_zero_count_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        let broken = config.input_dir.join("broken.png");
        std::fs::write(&broken, b"not an image").unwrap();

        let adapter = OcrAdapter::new(Box::new(MockRecognizer::new("should not be read")));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        let result = pipeline.process_document(&broken);

        assert_eq!(result, DocumentResult::empty("broken.png"));
    }

    #[test]
    fn persistence_failure_does_not_abort_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        let page = config.input_dir.join("scan.png");
        write_page(&page);

        // Output directories are never created, so both writes fail.
        let adapter = OcrAdapter::new(Box::new(MockRecognizer::new("Total $5.50")));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        let result = pipeline.process_document(&page);

        assert_eq!(result.char_count_after, 11);
        assert!(result.fields.amounts.contains("$5.50"));
        assert!(!config.output_json_dir.exists());
    }

    #[test]
    fn run_processes_batch_including_failed_loads() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        write_page(&config.input_dir.join("a.png"));
        write_page(&config.input_dir.join("b.PNG"));
        std::fs::write(config.input_dir.join("c.jpg"), b"garbage").unwrap();
        std::fs::write(config.input_dir.join("notes.txt"), b"ignored").unwrap();

        let adapter = OcrAdapter::new(Box::new(MockRecognizer::new("abcd")));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        let outcome = pipeline.run().unwrap();

        assert_eq!(outcome.results.len(), 3);
        let failed = outcome.results.iter().find(|r| r.filename == "c.jpg").unwrap();
        assert_eq!(failed.char_count_before, 0);
        assert_eq!(failed.char_count_after, 0);

        assert_eq!(outcome.report.total_before, 8);
        assert_eq!(outcome.report.total_after, 8);
        assert_eq!(outcome.report.documents.len(), 3);

        let report = std::fs::read_to_string(&config.report_path).unwrap();
        assert!(report.contains("OCR ACCURACY COMPARISON REPORT"));
        assert!(config.output_json_dir.join("a_extracted.json").exists());
        assert!(config.output_image_dir.join("b_preprocessed.png").exists());
    }

    #[test]
    fn run_fails_on_missing_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let adapter = OcrAdapter::new(Box::new(MockRecognizer::new("")));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        assert!(matches!(pipeline.run(), Err(PipelineError::InputDirMissing(_))));
    }

    #[test]
    fn run_fails_when_no_images() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        std::fs::write(config.input_dir.join("readme.md"), b"# nope").unwrap();

        let adapter = OcrAdapter::new(Box::new(MockRecognizer::new("")));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        assert!(matches!(pipeline.run(), Err(PipelineError::NoInputImages(_))));
        assert!(!config.report_path.exists());
    }

    #[test]
    fn report_write_failure_still_returns_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        write_page(&config.input_dir.join("a.png"));
        // A directory where the report file should go.
        config.report_path = dir.path().join("report_dir");
        std::fs::create_dir_all(&config.report_path).unwrap();

        let adapter = OcrAdapter::new(Box::new(MockRecognizer::new("x")));
        let pipeline = DocumentPipeline::new(&adapter, &config).unwrap();
        let outcome = pipeline.run().unwrap();
        assert_eq!(outcome.results.len(), 1);
    }

    #[test]
    fn image_extension_filter_is_case_insensitive() {
        assert!(has_image_extension(Path::new("a.TIFF")));
        assert!(has_image_extension(Path::new("a.Jpeg")));
        assert!(!has_image_extension(Path::new("a.gif")));
        assert!(!has_image_extension(Path::new("png")));
    }
}
