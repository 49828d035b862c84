use docket_core::{KernelSize, PreprocessConfig, ThresholdPolicy};
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::morphology::{self, Mask};
use thiserror::Error;

use crate::types::{BinaryImage, Document};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreprocessError {
    #[error("Invalid {role} kernel {size}: {reason}")]
    InvalidKernel {
        role: &'static str,
        size: KernelSize,
        reason: &'static str,
    },
    #[error("Invalid max value 0: binarized output would be blank")]
    InvalidMaxValue,
}

/// Largest side a structuring element may have.
pub const MAX_MORPH_KERNEL: u32 = 511;

/// Checks kernel geometry and max value. Nothing is clamped.
pub fn validate(cfg: &PreprocessConfig) -> Result<(), PreprocessError> {
    check_odd("blur", cfg.blur_kernel)?;
    check_odd("morphological", cfg.morph_kernel)?;
    check_element("morphological", cfg.morph_kernel)?;
    if let Some(k) = cfg.dilate_kernel {
        if !k.is_positive() {
            return Err(PreprocessError::InvalidKernel {
                role: "dilation",
                size: k,
                reason: "dimensions must be positive",
            });
        }
        check_element("dilation", k)?;
    }
    if cfg.max_value == 0 {
        return Err(PreprocessError::InvalidMaxValue);
    }
    Ok(())
}

fn check_odd(role: &'static str, size: KernelSize) -> Result<(), PreprocessError> {
    if !size.is_positive() {
        return Err(PreprocessError::InvalidKernel {
            role,
            size,
            reason: "dimensions must be positive",
        });
    }
    if !size.is_odd() {
        return Err(PreprocessError::InvalidKernel {
            role,
            size,
            reason: "dimensions must be odd",
        });
    }
    Ok(())
}

fn check_element(role: &'static str, size: KernelSize) -> Result<(), PreprocessError> {
    if size.width > MAX_MORPH_KERNEL || size.height > MAX_MORPH_KERNEL {
        return Err(PreprocessError::InvalidKernel {
            role,
            size,
            reason: "dimensions must be at most 511",
        });
    }
    Ok(())
}

/// Grayscale → blur → threshold → close → open → optional dilate.
///
/// Pure: the same document and config always give the same pixels.
pub fn preprocess(doc: &Document, cfg: &PreprocessConfig) -> Result<BinaryImage, PreprocessError> {
    validate(cfg)?;

    let gray = to_grayscale(doc.image());
    let blurred = blur(&gray, cfg.blur_kernel);
    let (binary, level) = binarize(&blurred, cfg);
    tracing::debug!(
        "Binarized {} with {} threshold {} ({}x{})",
        doc.filename(),
        cfg.threshold,
        level,
        binary.width(),
        binary.height()
    );

    let cleaned = open(&close(&binary, cfg.morph_kernel), cfg.morph_kernel);
    let out = match cfg.dilate_kernel {
        Some(k) => dilate(&cleaned, k),
        None => cleaned,
    };
    Ok(BinaryImage::new(out))
}

/// BT.601 luma, rounded to nearest.
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        Luma([luma as u8])
    })
}

// Fixed binomial taps used for small windows when no sigma is given.
const SMALL_GAUSSIAN_TAPS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Sigma used for a Gaussian window of `ksize` taps.
fn sigma_for(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn gaussian_kernel(ksize: u32) -> Vec<f32> {
    if ksize <= 7 && ksize % 2 == 1 {
        return SMALL_GAUSSIAN_TAPS[(ksize / 2) as usize].to_vec();
    }
    let sigma = sigma_for(ksize);
    let center = (ksize / 2) as f32;
    let raw: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

/// Separable Gaussian blur over a `kernel.width` × `kernel.height` window.
/// Odd windows up to 7 use binomial taps, wider ones derive sigma from the
/// size. Edge pixels are replicated past the border.
pub fn blur(img: &GrayImage, kernel: KernelSize) -> GrayImage {
    if img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let h = gaussian_kernel(kernel.width);
    let v = gaussian_kernel(kernel.height);
    imageproc::filter::separable_filter(img, &h, &v)
}

/// Applies the configured threshold policy. Returns the image and the cutoff used.
pub fn binarize(img: &GrayImage, cfg: &PreprocessConfig) -> (GrayImage, u8) {
    let max = cfg.max_value;
    match cfg.threshold {
        ThresholdPolicy::Fixed => {
            let t = cfg.threshold_value;
            (map_pixels(img, |p| if p >= t { max } else { 0 }), t)
        }
        ThresholdPolicy::Otsu => {
            if img.width() == 0 || img.height() == 0 {
                return (img.clone(), cfg.threshold_value);
            }
            let level = imageproc::contrast::otsu_level(img);
            (map_pixels(img, |p| if p > level { max } else { 0 }), level)
        }
    }
}

fn map_pixels(img: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| Luma([f(img.get_pixel(x, y)[0])]))
}

/// Max over a rectangular element anchored at `(w/2, h/2)`. Neighbours
/// outside the image are skipped.
///
/// # Panics
///
/// If a side of `kernel` is 0 or above [`MAX_MORPH_KERNEL`]; [`validate`]
/// rejects both.
pub fn dilate(img: &GrayImage, kernel: KernelSize) -> GrayImage {
    morphology::grayscale_dilate(img, &rect_mask(kernel))
}

/// Min over a rectangular element anchored at `(w/2, h/2)`. Same limits as
/// [`dilate`].
pub fn erode(img: &GrayImage, kernel: KernelSize) -> GrayImage {
    morphology::grayscale_erode(img, &rect_mask(kernel))
}

/// Dilate then erode: fills gaps narrower than the element.
pub fn close(img: &GrayImage, kernel: KernelSize) -> GrayImage {
    erode(&dilate(img, kernel), kernel)
}

/// Erode then dilate: drops specks smaller than the element.
pub fn open(img: &GrayImage, kernel: KernelSize) -> GrayImage {
    dilate(&erode(img, kernel), kernel)
}

fn rect_mask(kernel: KernelSize) -> Mask {
    let element = GrayImage::from_pixel(kernel.width, kernel.height, Luma([255u8]));
    Mask::from_image(&element, (kernel.width / 2) as u8, (kernel.height / 2) as u8)
}
