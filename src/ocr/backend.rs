//! OCR abstraction shared by all backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ExtractedData, Form};
use crate::storage::StorageError;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Cannot read document: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A document reader that produces raw text and structured fields.
///
/// Calls block on external work; run them off the async runtime.
pub trait Ocr: Send + Sync {
    /// Extract the document's text lines in reading order.
    fn extract_raw_text(&self, location: &str) -> Result<Vec<String>, OcrError>;

    /// Extract key/value fields.
    ///
    /// With a form hint, every form field is present in the result (empty when
    /// not found). Without one, extraction is best-effort.
    fn scan(&self, location: &str, form: Option<&Form>) -> Result<ExtractedData, OcrError>;
}

/// Configuration for OCR backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language for OCR (e.g., "eng", "chi_sim").
    pub language: String,
    /// Resolution used when rendering PDF pages.
    pub dpi: u32,
    /// Tesseract page segmentation mode, if overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_segmentation_mode: Option<u8>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: 300,
            page_segmentation_mode: None,
        }
    }
}
