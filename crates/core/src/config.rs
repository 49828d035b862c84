use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Rectangular structuring element / blur window, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSize {
    pub width: u32,
    pub height: u32,
}

impl KernelSize {
    pub const fn square(side: u32) -> Self {
        Self { width: side, height: side }
    }

    pub fn is_positive(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn is_odd(self) -> bool {
        self.width % 2 == 1 && self.height % 2 == 1
    }
}

impl fmt::Display for KernelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Per-image cutoff chosen by Otsu's method.
    #[default]
    Otsu,
    /// Global cutoff at `PreprocessConfig::threshold_value`.
    Fixed,
}

impl fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdPolicy::Otsu => write!(f, "otsu"),
            ThresholdPolicy::Fixed => write!(f, "fixed"),
        }
    }
}

impl std::str::FromStr for ThresholdPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "otsu" => Ok(ThresholdPolicy::Otsu),
            "fixed" => Ok(ThresholdPolicy::Fixed),
            other => Err(format!("Unknown threshold policy: '{other}'")),
        }
    }
}

/// Parameters for the binarization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub threshold: ThresholdPolicy,
    pub threshold_value: u8,
    pub max_value: u8,
    /// Element used by close and open. Must be odd.
    pub morph_kernel: KernelSize,
    /// Gaussian window. Must be odd.
    pub blur_kernel: KernelSize,
    /// Final stroke-thickening pass; `None` skips it.
    pub dilate_kernel: Option<KernelSize>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::Otsu,
            threshold_value: 127,
            max_value: 255,
            morph_kernel: KernelSize::square(3),
            blur_kernel: KernelSize::square(3),
            dilate_kernel: Some(KernelSize::square(2)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnginePreference {
    /// External binary first, then the in-process recognizer.
    #[default]
    Auto,
    TesseractCli,
    Leptess,
}

impl fmt::Display for EnginePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePreference::Auto => write!(f, "auto"),
            EnginePreference::TesseractCli => write!(f, "tesseract-cli"),
            EnginePreference::Leptess => write!(f, "leptess"),
        }
    }
}

impl std::str::FromStr for EnginePreference {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(EnginePreference::Auto),
            "tesseract-cli" | "tesseract" => Ok(EnginePreference::TesseractCli),
            "leptess" => Ok(EnginePreference::Leptess),
            other => Err(format!("Unknown OCR engine: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub engine: EnginePreference,
    /// Explicit path to the `tesseract` executable; skips discovery.
    pub tesseract_path: Option<PathBuf>,
    pub lang: String,
    /// Tessdata directory for the in-process engine.
    pub data_path: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: EnginePreference::Auto,
            tesseract_path: None,
            lang: "eng".to_string(),
            data_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_image_dir: PathBuf,
    pub output_json_dir: PathBuf,
    pub report_path: PathBuf,
    pub preprocess: PreprocessConfig,
    pub ocr: OcrConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_documents"),
            output_image_dir: PathBuf::from("output_images"),
            output_json_dir: PathBuf::from("output_json"),
            report_path: PathBuf::from("accuracy_report.txt"),
            preprocess: PreprocessConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}
