//! docextract - document OCR, field extraction and review.
//!
//! Documents are read from storage, run through Tesseract, scanned for
//! key/value fields (optionally guided by a form definition) and recorded in
//! SQLite, where a small HTTP API lets people review and verify the results.

pub mod cli;
pub mod config;
pub mod deploy;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod storage;
