//! OCR and field extraction.
//!
//! Tesseract is the only backend. Its TSV output is grouped into lines that
//! keep a confidence and bounding box, then scanned for key/value fields,
//! either generically (`key: value`) or guided by a [`Form`](crate::models::Form).

mod backend;
mod fields;
mod pdf;
mod tesseract;
mod tools;
mod tsv;

pub use backend::{Ocr, OcrConfig, OcrError};
pub use fields::{extract_generic, extract_with_form, parse_number};
pub use pdf::{find_page_image, pdf_page_count, pdf_page_to_image};
pub use tesseract::TesseractBackend;
pub use tools::check_binary;
pub use tsv::{parse_tsv, OcrLine};
