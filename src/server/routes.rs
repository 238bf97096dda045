//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/document/:id",
            get(handlers::get_document).put(handlers::put_document),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
