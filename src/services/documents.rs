//! Write and update operations over the [`Database`] façade.
//!
//! Errors from the database are returned unchanged.

use crate::models::{document_id_from_url, DocumentItem, DocumentStatus, ExtractedData};
use crate::repository::{Database, DatabaseError};

/// Register a document by identity and location only.
///
/// The written item is `pending` with no type or extracted data.
pub async fn write_document(db: &dyn Database, id: &str, url: &str) -> Result<(), DatabaseError> {
    let item = DocumentItem::new(id, url);
    tracing::debug!("Writing document {} ({})", item.id, item.url);
    db.write_document(&item).await
}

/// Record extraction results for the document at `url`.
///
/// The ID is derived from the URL and the status is always `complete`.
pub async fn update_document(
    db: &dyn Database,
    url: &str,
    document_type: &str,
    extracted_data: ExtractedData,
) -> Result<(), DatabaseError> {
    let item = DocumentItem::with_results(
        document_id_from_url(url),
        url,
        DocumentStatus::Complete,
        document_type,
        extracted_data,
    );
    tracing::debug!(
        "Updating document {} as {} with {} fields",
        item.id,
        document_type,
        item.extracted_data.as_ref().map_or(0, |d| d.len())
    );
    db.write_document(&item).await
}

/// Replace a document's extracted data with reviewed values.
///
/// Returns `None` when no document has this ID.
pub async fn verify_document(
    db: &dyn Database,
    id: &str,
    extracted_data: ExtractedData,
) -> Result<Option<DocumentItem>, DatabaseError> {
    let Some(mut item) = db.get_document(id).await? else {
        return Ok(None);
    };

    item.extracted_data = Some(extracted_data);
    item.status = DocumentStatus::Verified;
    db.write_document(&item).await?;

    Ok(Some(item))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::ExtractedField;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every write; optionally fails all calls.
    #[derive(Default)]
    pub(crate) struct RecordingDatabase {
        pub writes: Mutex<Vec<DocumentItem>>,
        pub fail_with: Option<String>,
    }

    impl RecordingDatabase {
        pub fn failing(message: &str) -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }

        pub fn writes(&self) -> Vec<DocumentItem> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Database for RecordingDatabase {
        async fn write_document(&self, item: &DocumentItem) -> Result<(), DatabaseError> {
            if let Some(message) = &self.fail_with {
                return Err(DatabaseError::Unavailable(message.clone()));
            }
            self.writes.lock().unwrap().push(item.clone());
            Ok(())
        }

        async fn get_document(&self, id: &str) -> Result<Option<DocumentItem>, DatabaseError> {
            if let Some(message) = &self.fail_with {
                return Err(DatabaseError::Unavailable(message.clone()));
            }
            Ok(self
                .writes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|item| item.id == id)
                .cloned())
        }
    }

    fn sample_data() -> ExtractedData {
        let mut data = ExtractedData::new();
        data.insert(
            "moof".to_string(),
            ExtractedField::new("dogcow").with_confidence(99.0),
        );
        data
    }

    #[tokio::test]
    async fn test_write_document_writes_once_with_defaults() {
        let db = RecordingDatabase::default();
        write_document(&db, "DogCow", "s3://bucket/moof/DogCow.txt")
            .await
            .unwrap();

        let writes = db.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].id, "DogCow");
        assert_eq!(writes[0].url, "s3://bucket/moof/DogCow.txt");
        assert_eq!(writes[0].status, DocumentStatus::Pending);
        assert_eq!(writes[0].document_type, None);
        assert_eq!(writes[0].extracted_data, None);
    }

    #[tokio::test]
    async fn test_update_document_derives_id_and_completes() {
        let db = RecordingDatabase::default();
        update_document(&db, "s3://bucket/moof/DogCow.txt", "W2", sample_data())
            .await
            .unwrap();
        update_document(&db, "s3://bucket/moof/DogCow.txt", "1099", ExtractedData::new())
            .await
            .unwrap();

        let writes = db.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|w| w.id == "DogCow"));
        assert!(writes.iter().all(|w| w.status == DocumentStatus::Complete));
        assert_eq!(writes[0].document_type.as_deref(), Some("W2"));
        assert_eq!(writes[0].extracted_data, Some(sample_data()));
    }

    #[tokio::test]
    async fn test_database_errors_propagate() {
        let db = RecordingDatabase::failing("oops");

        let err = write_document(&db, "a", "s3://bucket/a.pdf").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Unavailable(ref m) if m == "oops"));

        let err = update_document(&db, "s3://bucket/a.pdf", "W2", sample_data())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Unavailable(ref m) if m == "oops"));
        assert!(db.writes().is_empty());
    }

    #[tokio::test]
    async fn test_verify_document() {
        let db = RecordingDatabase::default();
        write_document(&db, "DogCow", "s3://bucket/moof/DogCow.txt")
            .await
            .unwrap();

        let verified = verify_document(&db, "DogCow", sample_data())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(verified.status, DocumentStatus::Verified);
        assert_eq!(verified.extracted_data, Some(sample_data()));
        assert_eq!(db.writes().last(), Some(&verified));

        assert!(verify_document(&db, "missing", sample_data())
            .await
            .unwrap()
            .is_none());
    }
}
