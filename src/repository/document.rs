//! Diesel-based document repository for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while maintaining Diesel's compile-time query checking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::database::{Database, DatabaseError};
use super::models::{DocumentRecord, NewDocument};
use super::pool::SqlitePool;
use super::util::parse_datetime;
use crate::models::{DocumentItem, DocumentStatus, ExtractedData};
use crate::schema::documents;

/// A document item together with its storage timestamps.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub item: DocumentItem,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert a database record to a domain model.
fn record_to_item(record: DocumentRecord) -> Result<StoredDocument, DatabaseError> {
    let status = DocumentStatus::from_str(&record.status).ok_or_else(|| DatabaseError::Corrupt {
        id: record.id.clone(),
        message: format!("unknown status '{}'", record.status),
    })?;

    let extracted_data = record
        .extracted_data
        .as_deref()
        .map(serde_json::from_str::<ExtractedData>)
        .transpose()
        .map_err(|e| DatabaseError::Corrupt {
            id: record.id.clone(),
            message: format!("invalid extracted_data: {}", e),
        })?;

    Ok(StoredDocument {
        created_at: parse_datetime(&record.created_at),
        updated_at: parse_datetime(&record.updated_at),
        item: DocumentItem {
            id: record.id,
            url: record.url,
            status,
            document_type: record.document_type,
            extracted_data,
        },
    })
}

/// Diesel-based document repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: SqlitePool,
}

impl DieselDocumentRepository {
    /// Create a new document repository with an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save an item (insert or update using ON CONFLICT).
    ///
    /// `created_at` is kept from the first write.
    pub async fn save(&self, item: &DocumentItem) -> Result<(), DatabaseError> {
        let mut conn = self.pool.get().await?;

        let extracted_json = item
            .extracted_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let now = Utc::now().to_rfc3339();

        let record = NewDocument {
            id: &item.id,
            url: &item.url,
            status: item.status.as_str(),
            document_type: item.document_type.as_deref(),
            extracted_data: extracted_json.as_deref(),
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(documents::table)
            .values(&record)
            .on_conflict(documents::id)
            .do_update()
            .set((
                documents::url.eq(record.url),
                documents::status.eq(record.status),
                documents::document_type.eq(record.document_type),
                documents::extracted_data.eq(record.extracted_data),
                documents::updated_at.eq(record.updated_at),
            ))
            .execute(&mut conn)
            .await?;

        tracing::debug!("Saved document {} ({})", item.id, item.status);
        Ok(())
    }

    /// Get a document with its timestamps.
    pub async fn get_stored(&self, id: &str) -> Result<Option<StoredDocument>, DatabaseError> {
        let mut conn = self.pool.get().await?;

        let record = documents::table
            .find(id)
            .first::<DocumentRecord>(&mut conn)
            .await
            .optional()?;

        record.map(record_to_item).transpose()
    }

    /// List documents, most recently updated first.
    pub async fn list(
        &self,
        status: Option<DocumentStatus>,
        limit: i64,
    ) -> Result<Vec<StoredDocument>, DatabaseError> {
        let mut conn = self.pool.get().await?;

        let records = match status {
            Some(status) => {
                documents::table
                    .filter(documents::status.eq(status.as_str()))
                    .order(documents::updated_at.desc())
                    .limit(limit)
                    .load::<DocumentRecord>(&mut conn)
                    .await?
            }
            None => {
                documents::table
                    .order(documents::updated_at.desc())
                    .limit(limit)
                    .load::<DocumentRecord>(&mut conn)
                    .await?
            }
        };

        records.into_iter().map(record_to_item).collect()
    }
}

#[async_trait]
impl Database for DieselDocumentRepository {
    async fn write_document(&self, item: &DocumentItem) -> Result<(), DatabaseError> {
        self.save(item).await
    }

    async fn get_document(&self, id: &str) -> Result<Option<DocumentItem>, DatabaseError> {
        Ok(self.get_stored(id).await?.map(|stored| stored.item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedField, FieldValue};
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselDocumentRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.documents(), dir)
    }

    fn sample_data() -> ExtractedData {
        let mut data = ExtractedData::new();
        data.insert(
            "name".to_string(),
            ExtractedField::new("Clarus").with_confidence(97.0),
        );
        data.insert("wages".to_string(), ExtractedField::new(52000.5));
        data
    }

    #[tokio::test]
    async fn test_document_crud() {
        let (repo, _dir) = setup_test_db().await;

        let item = DocumentItem::new("DogCow", "s3://bucket/input/DogCow.png");
        repo.write_document(&item).await.unwrap();

        let fetched = repo.get_document("DogCow").await.unwrap().unwrap();
        assert_eq!(fetched, item);

        let updated = DocumentItem::with_results(
            "DogCow",
            "s3://bucket/input/DogCow.png",
            DocumentStatus::Complete,
            "W2",
            sample_data(),
        );
        repo.write_document(&updated).await.unwrap();

        let fetched = repo.get_document("DogCow").await.unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::Complete);
        assert_eq!(fetched.document_type.as_deref(), Some("W2"));
        let data = fetched.extracted_data.unwrap();
        assert_eq!(data["wages"].value, FieldValue::Number(52000.5));
        assert_eq!(data["name"].confidence, Some(97.0));

        assert!(repo.get_document("Moof").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_created_at() {
        let (repo, _dir) = setup_test_db().await;

        repo.save(&DocumentItem::new("a", "s3://b/a.png")).await.unwrap();
        let first = repo.get_stored("a").await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let mut item = first.item.clone();
        item.status = DocumentStatus::Complete;
        repo.save(&item).await.unwrap();

        let second = repo.get_stored("a").await.unwrap().unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.item.status, DocumentStatus::Complete);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (repo, _dir) = setup_test_db().await;

        repo.save(&DocumentItem::new("one", "s3://b/one.png")).await.unwrap();
        repo.save(&DocumentItem::with_results(
            "two",
            "s3://b/two.png",
            DocumentStatus::Complete,
            "W2",
            sample_data(),
        ))
        .await
        .unwrap();

        assert_eq!(repo.list(None, 10).await.unwrap().len(), 2);

        let complete = repo.list(Some(DocumentStatus::Complete), 10).await.unwrap();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete[0].item.id, "two");

        assert_eq!(repo.list(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_schema_surfaces_error() {
        let dir = tempdir().unwrap();
        let repo = DbContext::new(&dir.path().join("empty.db")).documents();

        let err = repo
            .write_document(&DocumentItem::new("x", "s3://b/x.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Query(_)));
    }
}
