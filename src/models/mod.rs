//! Data models for docextract.

mod document;
mod form;

pub use document::{
    document_id_from_url, BoundingBox, DocumentItem, DocumentStatus, ExtractedData,
    ExtractedField, FieldValue,
};
pub use form::{FieldKind, Form, FormError, FormField, FormRegistry};
