use serde::{Deserialize, Serialize};

use crate::fields::ExtractedFields;

/// Outcome of running one input file through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentResult {
    pub filename: String,
    pub text_before: String,
    pub text_after: String,
    pub char_count_before: usize,
    pub char_count_after: usize,
    pub fields: ExtractedFields,
}

impl DocumentResult {
    /// Builds a result from the raw and preprocessed OCR texts. Counts are in
    /// characters, not bytes.
    pub fn new(
        filename: impl Into<String>,
        text_before: String,
        text_after: String,
        fields: ExtractedFields,
    ) -> Self {
        let char_count_before = text_before.chars().count();
        let char_count_after = text_after.chars().count();
        Self {
            filename: filename.into(),
            text_before,
            text_after,
            char_count_before,
            char_count_after,
            fields,
        }
    }

    /// Zero-count record for a document that could not be loaded.
    pub fn empty(filename: impl Into<String>) -> Self {
        Self::new(filename, String::new(), String::new(), ExtractedFields::default())
    }

    pub fn improvement_percent(&self) -> f64 {
        improvement_percent(self.char_count_before, self.char_count_after)
    }
}

/// `(after - before) / before * 100`, or exactly 0 when `before` is 0.
pub fn improvement_percent(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (after as f64 - before as f64) / before as f64 * 100.0
}
