//! Document models for extraction results.
//!
//! A `DocumentItem` is created per write/update call and handed to the
//! database façade, which owns the persisted copy from then on.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Processing status of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Registered, extraction not yet run.
    #[default]
    Pending,
    /// Extraction finished.
    Complete,
    /// Extracted data reviewed and saved by a person.
    Verified,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Verified => "verified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "complete" => Some(Self::Complete),
            "verified" => Some(Self::Verified),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned field value: either free text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Region of a page, as fractions of the page width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = (self.left + self.width).max(other.left + other.width);
        let bottom = (self.top + self.height).max(other.top + other.height);
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// One extracted field with the engine's confidence and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: FieldValue,
    /// Engine confidence on a 0-100 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(
        default,
        rename = "boundingBox",
        skip_serializing_if = "Option::is_none"
    )]
    pub bounding_box: Option<BoundingBox>,
}

impl ExtractedField {
    pub fn new(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            confidence: None,
            bounding_box: None,
        }
    }

    /// A placeholder for a field the scan did not find.
    pub fn missing() -> Self {
        Self::new("")
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}

/// Field name to extracted field, ordered by name.
pub type ExtractedData = BTreeMap<String, ExtractedField>;

/// A document's identity, location, and extraction results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentItem {
    /// Unique key. Never changes after creation.
    pub id: String,
    /// Location of the stored content (`s3://bucket/key`, `file://...`, or a path).
    pub url: String,
    pub status: DocumentStatus,
    /// Classification label such as `W2`.
    pub document_type: Option<String>,
    pub extracted_data: Option<ExtractedData>,
}

impl DocumentItem {
    /// Create an item with only identity and location set.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            status: DocumentStatus::default(),
            document_type: None,
            extracted_data: None,
        }
    }

    /// Create a fully populated item.
    pub fn with_results(
        id: impl Into<String>,
        url: impl Into<String>,
        status: DocumentStatus,
        document_type: impl Into<String>,
        extracted_data: ExtractedData,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            status,
            document_type: Some(document_type.into()),
            extracted_data: Some(extracted_data),
        }
    }
}

/// Derive a document ID from its location: the filename stem of the last path segment.
///
/// `s3://bucket/moof/DogCow.txt` becomes `DogCow`.
pub fn document_id_from_url(url: &str) -> String {
    let without_suffix = url.split(['?', '#']).next().unwrap_or(url);
    let trimmed = without_suffix.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);

    Path::new(segment)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(segment)
        .to_string()
}
