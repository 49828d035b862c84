pub mod config;
pub mod document;
pub mod fields;
pub mod report;

pub use config::{
    ConfigError, EnginePreference, KernelSize, OcrConfig, PipelineConfig, PreprocessConfig,
    ThresholdPolicy,
};
pub use document::{improvement_percent, DocumentResult};
pub use fields::ExtractedFields;
pub use report::{AccuracyReport, DocumentSummary};
