use image::{DynamicImage, GrayImage, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to load image '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A scanned input page: 8-bit RGB raster plus the file name it came from.
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    image: RgbImage,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let img = image::open(path).map_err(|source| DocumentError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_rgb(filename, img.to_rgb8()))
    }

    pub fn from_rgb(filename: impl Into<String>, image: RgbImage) -> Self {
        Self { filename: filename.into(), image }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Single-channel raster whose pixels are either 0 or the configured max value.
///
/// Only the preprocessor builds one, so the two-level invariant holds for every
/// instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage(GrayImage);

impl BinaryImage {
    pub(crate) fn new(image: GrayImage) -> Self {
        Self(image)
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_inner(self) -> GrayImage {
        self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// Anything the OCR adapter can feed to an engine.
pub trait OcrImage {
    fn encode_png(&self) -> Result<Vec<u8>, image::ImageError>;
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

impl OcrImage for Document {
    fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        encode_as_png(DynamicImage::ImageRgb8(self.image.clone()))
    }
}

impl OcrImage for BinaryImage {
    fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        encode_as_png(DynamicImage::ImageLuma8(self.0.clone()))
    }
}
