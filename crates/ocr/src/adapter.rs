use docket_core::{EnginePreference, OcrConfig};
use std::sync::OnceLock;

use crate::recognizer::{OcrBackend, OcrError, TesseractCli};
use crate::types::OcrImage;

static GLOBAL: OnceLock<OcrAdapter> = OnceLock::new();

/// The one OCR engine a process uses, behind a never-failing text contract.
pub struct OcrAdapter {
    backend: Box<dyn OcrBackend>,
}

impl OcrAdapter {
    pub fn new(backend: Box<dyn OcrBackend>) -> Self {
        Self { backend }
    }

    /// Probes engines in preference order and keeps the first usable one.
    pub fn detect(cfg: &OcrConfig) -> Result<Self, OcrError> {
        let order: &[EnginePreference] = match cfg.engine {
            EnginePreference::Auto => &[EnginePreference::TesseractCli, EnginePreference::Leptess],
            EnginePreference::TesseractCli => &[EnginePreference::TesseractCli],
            EnginePreference::Leptess => &[EnginePreference::Leptess],
        };

        for engine in order {
            match probe(*engine, cfg) {
                Ok(backend) => {
                    tracing::info!("Initialized OCR engine: {}", backend.name());
                    return Ok(Self::new(backend));
                }
                Err(e) => tracing::warn!("OCR engine {engine} unavailable: {e}"),
            }
        }
        Err(OcrError::NoEngineAvailable)
    }

    /// Process-wide engine. The first successful call decides; later calls
    /// return that engine whatever config they pass.
    pub fn init_global(cfg: &OcrConfig) -> Result<&'static OcrAdapter, OcrError> {
        if let Some(existing) = GLOBAL.get() {
            return Ok(existing);
        }
        let adapter = Self::detect(cfg)?;
        Ok(GLOBAL.get_or_init(|| adapter))
    }

    pub fn global() -> Option<&'static OcrAdapter> {
        GLOBAL.get()
    }

    pub fn engine_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Recognized text, or `""` when nothing was read or the engine failed.
    pub fn extract_text(&self, image: &impl OcrImage) -> String {
        let png = match image.encode_png() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Could not encode image for OCR: {e}");
                return String::new();
            }
        };
        match self.backend.recognize(&png) {
            Ok(text) => {
                if text.trim().is_empty() {
                    tracing::warn!("{} returned no text", self.backend.name());
                }
                text
            }
            Err(e) => {
                tracing::warn!("Text extraction failed: {e}");
                String::new()
            }
        }
    }
}

fn probe(engine: EnginePreference, cfg: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    match engine {
        EnginePreference::TesseractCli => Ok(Box::new(TesseractCli::discover(
            cfg.tesseract_path.as_deref(),
            &cfg.lang,
        )?)),
        EnginePreference::Leptess => probe_leptess(cfg),
        EnginePreference::Auto => Err(OcrError::NoEngineAvailable),
    }
}

#[cfg(feature = "tesseract")]
fn probe_leptess(cfg: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    use crate::recognizer::leptess_backend::LeptessRecognizer;
    Ok(Box::new(LeptessRecognizer::probe(cfg.data_path.clone(), &cfg.lang)?))
}

#[cfg(not(feature = "tesseract"))]
fn probe_leptess(_cfg: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    Err(OcrError::Unavailable {
        engine: "leptess",
        reason: "built without the `tesseract` feature".to_string(),
    })
}
