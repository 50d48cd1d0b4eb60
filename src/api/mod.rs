//! HTTP API

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::AppState;
pub use models::{ApiError, SearchRequest, SearchResponse};
pub use routes::build_router;
