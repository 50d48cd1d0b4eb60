//! Router construction

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};
use crate::config::ServerConfig;

/// Build the API router
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/process-embeddings", post(handlers::process_embeddings))
        .route("/api/search", post(handlers::search))
        .route("/api/photos", get(handlers::list_photos))
        .route("/api/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
