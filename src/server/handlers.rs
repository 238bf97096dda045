//! HTTP handlers for the document review API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::{DocumentItem, ExtractedData};
use crate::services::verify_document;
use crate::storage::object_key;

/// Document response format for the API.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document_id: String,
    pub document_key: String,
    pub document_url: String,
    pub status: String,
    pub document_type: Option<String>,
    pub extracted_data: Option<ExtractedData>,
    pub base64_encoded_file: Option<String>,
}

impl DocumentResponse {
    fn new(item: DocumentItem, base64_encoded_file: Option<String>) -> Self {
        Self {
            document_key: object_key(&item.url),
            document_id: item.id,
            document_url: item.url,
            status: item.status.to_string(),
            document_type: item.document_type,
            extracted_data: item.extracted_data,
            base64_encoded_file,
        }
    }
}

/// Body of a verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub extracted_data: ExtractedData,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Document not found")
}

/// Fetch a document with its stored file inlined as base64.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let item = match state.db.get_document(&id).await {
        Ok(Some(item)) => item,
        Ok(None) => return not_found(),
        Err(e) => {
            tracing::error!("Failed to load document {}: {}", id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let encoded = read_encoded(&state, &item.url).await;
    Json(DocumentResponse::new(item, encoded)).into_response()
}

async fn read_encoded(state: &AppState, url: &str) -> Option<String> {
    let path = match state.store.resolve(url) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("Cannot resolve {}: {}", url, e);
            return None;
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => Some(STANDARD.encode(bytes)),
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// Store reviewed field values and mark the document verified.
pub async fn put_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<VerifyRequest>,
) -> impl IntoResponse {
    match verify_document(state.db.as_ref(), &id, body.extracted_data).await {
        Ok(Some(item)) => {
            tracing::info!("Document {} verified", id);
            Json(DocumentResponse::new(item, None)).into_response()
        }
        Ok(None) => not_found(),
        Err(e) => {
            tracing::error!("Failed to verify document {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
