//! The database façade used by the document operations.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::DocumentItem;

/// Errors raised by a document store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Stored document {id} is corrupt: {message}")]
    Corrupt { id: String, message: String },

    #[error("Failed to encode extracted data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Database unavailable: {0}")]
    Unavailable(String),
}

/// A store that persists document items.
///
/// Writes replace the whole item under its ID.
#[async_trait]
pub trait Database: Send + Sync {
    /// Write an item, replacing any existing item with the same ID.
    async fn write_document(&self, item: &DocumentItem) -> Result<(), DatabaseError>;

    /// Fetch an item by ID.
    async fn get_document(&self, id: &str) -> Result<Option<DocumentItem>, DatabaseError>;
}
