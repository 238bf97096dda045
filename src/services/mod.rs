//! Service layer for document business logic.
//!
//! Services hold no UI concerns and are shared by the CLI and the web server.

pub mod documents;
pub mod extraction;

pub use documents::{update_document, verify_document, write_document};
pub use extraction::{ExtractionError, ExtractionService, UNCLASSIFIED};
