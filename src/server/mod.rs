//! Web server for reviewing and verifying extracted documents.

mod handlers;
mod routes;

pub use handlers::{DocumentResponse, VerifyRequest};
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::Database;
use crate::storage::DocumentStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub store: DocumentStore,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, store: DocumentStore) -> Self {
        Self { db, store }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let ctx = settings.create_db_context();
        Self::new(Arc::new(ctx.documents()), settings.document_store())
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(AppState::from_settings(settings));

    tracing::info!("Starting server at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
