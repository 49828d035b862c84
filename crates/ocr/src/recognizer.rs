use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR engine '{engine}' is not available: {reason}")]
    Unavailable { engine: &'static str, reason: String },
    #[error(
        "No OCR engine available. Install the `tesseract` binary or build with the `tesseract` feature"
    )]
    NoEngineAvailable,
}

/// Abstraction over an OCR backend.
/// Implementations accept PNG bytes and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn recognize(&self, png_bytes: &[u8]) -> Result<String, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string regardless of the image.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn recognize(&self, _png_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── External `tesseract` binary ───────────────────────────────────────────────

#[cfg(windows)]
const WINDOWS_INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

/// Runs the `tesseract` executable on a temporary PNG and reads stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
    lang: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>, lang: &str) -> Self {
        Self { program: program.into(), lang: lang.to_string() }
    }

    /// Finds a working executable: the explicit path if given, otherwise the
    /// platform's usual locations. The candidate must answer `--version`.
    pub fn discover(explicit: Option<&Path>, lang: &str) -> Result<Self, OcrError> {
        let program = match explicit {
            Some(p) => p.to_path_buf(),
            None => locate_executable().ok_or_else(|| OcrError::Unavailable {
                engine: "tesseract-cli",
                reason: "executable not found on this system".to_string(),
            })?,
        };
        let cli = Self::new(program, lang);
        let version = cli.version()?;
        tracing::info!("Tesseract found at {} ({version})", cli.program.display());
        Ok(cli)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// First line of `tesseract --version`.
    pub fn version(&self) -> Result<String, OcrError> {
        let out = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| OcrError::Unavailable {
                engine: "tesseract-cli",
                reason: format!("{}: {e}", self.program.display()),
            })?;
        if !out.status.success() {
            return Err(OcrError::Unavailable {
                engine: "tesseract-cli",
                reason: format!("{} --version exited with {}", self.program.display(), out.status),
            });
        }
        // Older releases print the banner on stderr.
        let banner = if out.stdout.is_empty() { &out.stderr } else { &out.stdout };
        Ok(String::from_utf8_lossy(banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn command(&self, image_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(image_path).arg("stdout").arg("-l").arg(&self.lang);
        cmd
    }
}

#[cfg(windows)]
fn locate_executable() -> Option<PathBuf> {
    WINDOWS_INSTALL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| lookup_on_path("where"))
}

#[cfg(not(windows))]
fn locate_executable() -> Option<PathBuf> {
    lookup_on_path("which")
}

fn lookup_on_path(finder: &str) -> Option<PathBuf> {
    let out = Command::new(finder).arg("tesseract").output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
}

impl OcrBackend for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract-cli"
    }

    fn recognize(&self, png_bytes: &[u8]) -> Result<String, OcrError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("docket-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Engine(format!("temp file: {e}")))?;
        tmp.write_all(png_bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| OcrError::Engine(format!("temp file: {e}")))?;

        let out = self
            .command(tmp.path())
            .output()
            .map_err(|e| OcrError::Engine(format!("{}: {e}", self.program.display())))?;
        if !out.status.success() {
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

// ── In-process Tesseract LSTM recognizer (optional, `tesseract` feature) ──────

#[cfg(feature = "tesseract")]
pub mod leptess_backend {
    use super::{OcrBackend, OcrError};
    use leptess::LepTess;
    use std::path::PathBuf;

    pub struct LeptessRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl LeptessRecognizer {
        /// Loads the model once to confirm the language data is usable.
        pub fn probe(data_path: Option<PathBuf>, lang: &str) -> Result<Self, OcrError> {
            let data_path = data_path.map(|p| p.to_string_lossy().into_owned());
            LepTess::new(data_path.as_deref(), lang).map_err(|e| OcrError::Unavailable {
                engine: "leptess",
                reason: e.to_string(),
            })?;
            Ok(Self { data_path, lang: lang.to_string() })
        }
    }

    impl OcrBackend for LeptessRecognizer {
        fn name(&self) -> &'static str {
            "leptess"
        }

        fn recognize(&self, png_bytes: &[u8]) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(png_bytes)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
