use anyhow::{Context, Result};
use clap::Parser;
use docket_core::{EnginePreference, PipelineConfig, ThresholdPolicy};
use std::path::PathBuf;

/// Preprocess scanned invoices, OCR them before and after, and extract
/// dates, amounts and emails.
#[derive(Parser, Debug)]
#[command(name = "docket", version, about)]
pub struct Cli {
    /// TOML file with pipeline settings. Flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory of scanned pages (.png, .jpg, .jpeg, .bmp, .tiff).
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Where `<stem>_preprocessed.png` files go.
    #[arg(long)]
    pub output_images: Option<PathBuf>,

    /// Where `<stem>_extracted.json` files go.
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Accuracy report destination.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Binarization policy: otsu or fixed.
    #[arg(long)]
    pub threshold: Option<ThresholdPolicy>,

    /// Cutoff for the fixed policy.
    #[arg(long)]
    pub threshold_value: Option<u8>,

    /// OCR engine: auto, tesseract-cli or leptess.
    #[arg(long)]
    pub engine: Option<EnginePreference>,

    /// Explicit path to the `tesseract` executable.
    #[arg(long)]
    pub tesseract_path: Option<PathBuf>,

    /// Tesseract language code, e.g. `eng` or `eng+deu`.
    #[arg(long)]
    pub lang: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_images {
            config.output_image_dir = dir.clone();
        }
        if let Some(dir) = &self.output_json {
            config.output_json_dir = dir.clone();
        }
        if let Some(path) = &self.report {
            config.report_path = path.clone();
        }
        if let Some(policy) = self.threshold {
            config.preprocess.threshold = policy;
        }
        if let Some(value) = self.threshold_value {
            config.preprocess.threshold_value = value;
        }
        if let Some(engine) = self.engine {
            config.ocr.engine = engine;
        }
        if let Some(path) = &self.tesseract_path {
            config.ocr.tesseract_path = Some(path.clone());
        }
        if let Some(lang) = &self.lang {
            config.ocr.lang = lang.clone();
        }
    }
}
