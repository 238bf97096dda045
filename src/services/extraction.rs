//! The extraction pipeline: read text, classify, scan fields, record results.

use std::sync::Arc;

use thiserror::Error;

use super::documents::update_document;
use crate::models::{
    document_id_from_url, DocumentItem, DocumentStatus, ExtractedData, Form, FormRegistry,
};
use crate::ocr::{Ocr, OcrError};
use crate::repository::{Database, DatabaseError};

/// Document type recorded when no form matches.
pub const UNCLASSIFIED: &str = "unclassified";

/// Errors from running the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Unknown document type: {0}")]
    UnknownForm(String),

    #[error("OCR task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs OCR and field scanning for a document and stores the result.
#[derive(Clone)]
pub struct ExtractionService {
    db: Arc<dyn Database>,
    ocr: Arc<dyn Ocr>,
    forms: Arc<FormRegistry>,
}

impl ExtractionService {
    pub fn new(db: Arc<dyn Database>, ocr: Arc<dyn Ocr>, forms: FormRegistry) -> Self {
        Self {
            db,
            ocr,
            forms: Arc::new(forms),
        }
    }

    pub fn forms(&self) -> &FormRegistry {
        &self.forms
    }

    /// Extract fields from the document at `url` and record them.
    ///
    /// An explicit `document_type` must name a registered form. Without one,
    /// the document's text picks the form, falling back to generic
    /// extraction recorded as [`UNCLASSIFIED`].
    pub async fn process(
        &self,
        url: &str,
        document_type: Option<&str>,
    ) -> Result<DocumentItem, ExtractionError> {
        let form = match document_type {
            Some(name) => Some(
                self.forms
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ExtractionError::UnknownForm(name.to_string()))?,
            ),
            None => self.classify(url).await?,
        };

        let type_name = form
            .as_ref()
            .map(|f| f.name.clone())
            .unwrap_or_else(|| UNCLASSIFIED.to_string());
        tracing::info!("Scanning {} as {}", url, type_name);

        let ocr = Arc::clone(&self.ocr);
        let location = url.to_string();
        let data: ExtractedData =
            tokio::task::spawn_blocking(move || ocr.scan(&location, form.as_ref())).await??;

        update_document(self.db.as_ref(), url, &type_name, data.clone()).await?;
        tracing::info!("Recorded {} fields for {}", data.len(), url);

        Ok(DocumentItem::with_results(
            document_id_from_url(url),
            url,
            DocumentStatus::Complete,
            type_name,
            data,
        ))
    }

    /// Read the document's text and pick the best matching form.
    async fn classify(&self, url: &str) -> Result<Option<Form>, ExtractionError> {
        let ocr = Arc::clone(&self.ocr);
        let location = url.to_string();
        let lines = tokio::task::spawn_blocking(move || ocr.extract_raw_text(&location)).await??;

        let form = self.forms.classify(&lines).cloned();
        match &form {
            Some(f) => tracing::debug!("Classified {} as {}", url, f.name),
            None => tracing::debug!("No form matched {} ({} lines)", url, lines.len()),
        }
        Ok(form)
    }
}
