//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite database.

pub mod context;
pub mod database;
pub mod document;
pub mod models;
pub mod pool;
pub mod util;

pub use context::DbContext;
pub use database::{Database, DatabaseError};
pub use document::{DieselDocumentRepository, StoredDocument};
pub use models::{DocumentRecord, NewDocument};
pub use pool::{DbError, SqlitePool};
