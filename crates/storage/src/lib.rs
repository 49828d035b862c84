pub mod artifacts;

pub use artifacts::{
    ensure_dir, load_record, preprocessed_image_path, record_path, save_preprocessed_image,
    save_record, write_report, ExtractionRecord, StorageError, EXTRACTED_TEXT_PREVIEW_CHARS,
};
