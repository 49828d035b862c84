use docket_core::ExtractedFields;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Characters of post-preprocessing text kept in the JSON record.
pub const EXTRACTED_TEXT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("JSON error on '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk JSON form of one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub filename: String,
    pub extracted_text: String,
    pub dates: Vec<String>,
    pub amounts: Vec<String>,
    pub emails: Vec<String>,
    /// ISO-8601 local time with offset.
    pub processing_timestamp: String,
}

impl ExtractionRecord {
    pub fn new(filename: &str, text_after: &str, fields: &ExtractedFields) -> Self {
        Self {
            filename: filename.to_string(),
            extracted_text: text_after.chars().take(EXTRACTED_TEXT_PREVIEW_CHARS).collect(),
            dates: fields.dates.iter().cloned().collect(),
            amounts: fields.amounts.iter().cloned().collect(),
            emails: fields.emails.clone(),
            processing_timestamp: chrono::Local::now().to_rfc3339(),
        }
    }
}

fn file_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// `<dir>/<stem>_preprocessed.png`
pub fn preprocessed_image_path(dir: &Path, source: &Path) -> PathBuf {
    dir.join(format!("{}_preprocessed.png", file_stem(source)))
}

/// `<dir>/<stem>_extracted.json`
pub fn record_path(dir: &Path, source: &Path) -> PathBuf {
    dir.join(format!("{}_extracted.json", file_stem(source)))
}

pub fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes the binarized image as PNG next to its siblings in `dir`.
pub fn save_preprocessed_image(
    dir: &Path,
    source: &Path,
    image: &GrayImage,
) -> Result<PathBuf, StorageError> {
    let path = preprocessed_image_path(dir, source);
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| StorageError::Image { path: path.clone(), source })?;
    tracing::debug!("Saved preprocessed image: {}", path.display());
    Ok(path)
}

pub fn save_record(
    dir: &Path,
    source: &Path,
    record: &ExtractionRecord,
) -> Result<PathBuf, StorageError> {
    let path = record_path(dir, source);
    let json = serde_json::to_string_pretty(record).map_err(|source| StorageError::Json {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, json).map_err(|source| StorageError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!("Saved JSON record: {}", path.display());
    Ok(path)
}

pub fn load_record(path: &Path) -> Result<ExtractionRecord, StorageError> {
    let data = std::fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the rendered report, creating the parent directory if needed.
pub fn write_report(path: &Path, report: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    std::fs::write(path, report).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}
