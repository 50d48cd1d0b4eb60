use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::{
    error_codes, ApiError, HealthResponse, PhotoSummary, PhotosResponse, SearchRequest,
    SearchResponse,
};
use crate::config::Config;
use crate::index::SemanticIndex;
use crate::ingest::{IngestionPipeline, ProgressEvent};
use crate::library::{DiskLibrary, PhotoLibrary};
use crate::metrics::METRICS;
use crate::search::{SearchEngine, SearchError, SearchMode};
use crate::upstream::{CachedEmbedder, Captioner, Embedder, OpenAiCaptioner, OpenAiEmbedder};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub index: SemanticIndex,
    pub library: Arc<dyn PhotoLibrary>,
    pub pipeline: Arc<IngestionPipeline>,
    pub engine: Arc<SearchEngine>,
}

impl AppState {
    /// Wire ingestion and search to the same index
    pub fn new(
        index: SemanticIndex,
        captioner: Arc<dyn Captioner>,
        library: Arc<dyn PhotoLibrary>,
        config: &Config,
    ) -> Self {
        let pipeline = IngestionPipeline::new(
            index.clone(),
            captioner,
            Arc::clone(&library),
            config.ingest.clone(),
        );
        let engine = SearchEngine::new(index.clone(), Arc::clone(&library), config.search.clone());

        Self {
            index,
            library,
            pipeline: Arc::new(pipeline),
            engine: Arc::new(engine),
        }
    }

    /// Build the production wiring: disk library, OpenAI-compatible clients
    /// and a cached embedder shared by ingestion and search.
    ///
    /// Creates the uploads directory if it does not exist yet.
    pub async fn from_config(config: &Config) -> crate::error::Result<Self> {
        let library = DiskLibrary::new(
            config.library.uploads_dir.clone(),
            config.library.public_prefix.clone(),
        );
        library.ensure_root().await?;
        info!("Serving photos from {}", library.root().display());

        let captioner: Arc<dyn Captioner> = Arc::new(OpenAiCaptioner::new(config.upstream.clone())?);
        let embedder: Arc<dyn Embedder> = Arc::new(CachedEmbedder::new(
            Arc::new(OpenAiEmbedder::new(config.upstream.clone())?),
            config.upstream.embedding_cache_size,
            config.upstream.embedding_cache_ttl(),
        ));

        Ok(Self::new(SemanticIndex::new(embedder), captioner, Arc::new(library), config))
    }
}

fn progress_frame(event: &ProgressEvent) -> Event {
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}

/// Index all stored photos, streaming progress as server-sent events
///
/// POST /api/process-embeddings
pub async fn process_embeddings(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("Ingestion requested");

    let events = state
        .pipeline
        .run()
        .map(|event| Ok::<_, Infallible>(progress_frame(&event)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Search photos by natural-language query
///
/// POST /api/search
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
    let requested = if request.use_smart_search {
        SearchMode::Smart
    } else {
        SearchMode::Basic
    };

    match state.engine.search(&request.query, requested).await {
        Ok(outcome) => Ok(Json(SearchResponse {
            success: true,
            query: request.query,
            results: outcome.results,
            search_type: outcome.mode.as_str().to_string(),
        })),
        Err(SearchError::EmptyQuery) => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(error_codes::VALIDATION_ERROR, "Search query required")),
        )),
        Err(e @ SearchError::Precondition(_)) => {
            error!("Search rejected: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiError::new(error_codes::PRECONDITION_FAILED, e.to_string())),
            ))
        }
        Err(e) => {
            error!("Search failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(error_codes::INTERNAL_ERROR, "Search failed")),
            ))
        }
    }
}

/// List stored photos with their index state
///
/// GET /api/photos
pub async fn list_photos(State(state): State<AppState>) -> ApiResult<PhotosResponse> {
    let items = state.library.list().await.map_err(|e| {
        warn!("Failed to read photos: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(error_codes::INTERNAL_ERROR, "Failed to read photos")),
        )
    })?;

    let store = state.index.store();
    let photos = items
        .into_iter()
        .map(|item| {
            let entry = store.get(&item.id);
            PhotoSummary {
                has_embedding: entry.is_some(),
                description: entry.map(|e| e.caption.clone()),
                filename: item.id,
                path: item.path,
                size: item.size,
                upload_date: item.uploaded_at,
            }
        })
        .collect();

    Ok(Json(PhotosResponse {
        photos,
        smart_search_enabled: state.index.is_ready(),
    }))
}

/// Health and index status
///
/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        smart_search_ready: state.index.is_ready(),
        photos_processed: state.index.store().size(),
        ingestion_running: state.pipeline.is_running(),
    })
}

/// Prometheus metrics
///
/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    METRICS.set_index_entries(state.index.store().size());
    METRICS.export_prometheus()
}
