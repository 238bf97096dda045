//! Tesseract OCR backend.
//!
//! Runs the `tesseract` CLI in TSV mode so each line carries a confidence
//! and bounding box. PDFs are rendered page by page with `pdftoppm`; plain
//! text documents are read as-is.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tempfile::TempDir;

use super::backend::{Ocr, OcrConfig, OcrError};
use super::fields::{extract_generic, extract_with_form};
use super::pdf::{pdf_page_count, pdf_page_to_image};
use super::tools::{check_binary, spawn_error};
use super::tsv::{parse_tsv, OcrLine};
use crate::models::{ExtractedData, Form};
use crate::storage::{detect_mime_type, DocumentStore};

/// Tesseract OCR backend reading documents from a [`DocumentStore`].
pub struct TesseractBackend {
    config: OcrConfig,
    store: DocumentStore,
}

impl TesseractBackend {
    pub fn new(store: DocumentStore) -> Self {
        Self::with_config(store, OcrConfig::default())
    }

    pub fn with_config(store: DocumentStore, config: OcrConfig) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    pub fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else if !check_binary("pdftoppm") {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    /// Recognize the lines of the document at `location`.
    pub fn recognize_lines(&self, location: &str) -> Result<Vec<OcrLine>, OcrError> {
        let start = Instant::now();
        let path = self.store.locate(location)?;
        let content = std::fs::read(&path)?;
        let mime = detect_mime_type(&path, &content);

        let lines = match mime.as_str() {
            "text/plain" => plain_text_lines(&content),
            "application/pdf" => self.recognize_pdf(&path)?,
            m if m.starts_with("image/") => self.recognize_image(&path)?,
            other => return Err(OcrError::UnsupportedFileType(other.to_string())),
        };

        tracing::debug!(
            "Recognized {} lines from {} ({}) in {}ms",
            lines.len(),
            location,
            mime,
            start.elapsed().as_millis()
        );
        Ok(lines)
    }

    fn recognize_pdf(&self, pdf_path: &Path) -> Result<Vec<OcrLine>, OcrError> {
        let pages = pdf_page_count(pdf_path)?;
        let temp_dir = TempDir::new()?;

        let mut lines = Vec::new();
        for page in 1..=pages {
            let image = pdf_page_to_image(pdf_path, page, self.config.dpi, temp_dir.path())?;
            lines.extend(self.recognize_image(&image)?);
            std::fs::remove_file(&image)?;
        }
        Ok(lines)
    }

    fn recognize_image(&self, image_path: &Path) -> Result<Vec<OcrLine>, OcrError> {
        let mut cmd = Command::new("tesseract");
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language]);
        if let Some(psm) = self.config.page_segmentation_mode {
            cmd.args(["--psm", &psm.to_string()]);
        }
        cmd.arg("tsv");

        let output = cmd
            .output()
            .map_err(|e| spawn_error(e, "tesseract", "tesseract-ocr"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn plain_text_lines(content: &[u8]) -> Vec<OcrLine> {
    String::from_utf8_lossy(content)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|text| OcrLine {
            text: text.to_string(),
            confidence: None,
            bounding_box: None,
        })
        .collect()
}

impl Ocr for TesseractBackend {
    fn extract_raw_text(&self, location: &str) -> Result<Vec<String>, OcrError> {
        Ok(self
            .recognize_lines(location)?
            .into_iter()
            .map(|line| line.text)
            .collect())
    }

    fn scan(&self, location: &str, form: Option<&Form>) -> Result<ExtractedData, OcrError> {
        let lines = self.recognize_lines(location)?;
        Ok(match form {
            Some(form) => extract_with_form(&lines, form),
            None => extract_generic(&lines),
        })
    }
}
