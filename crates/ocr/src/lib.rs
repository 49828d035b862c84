pub mod adapter;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use adapter::OcrAdapter;
pub use extract::extract_fields;
pub use pipeline::{list_images, BatchOutcome, DocumentPipeline, PipelineError};
pub use preprocess::{preprocess, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, TesseractCli};
pub use types::{BinaryImage, Document, DocumentError, OcrImage};
