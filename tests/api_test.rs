//! HTTP surface, driven through the router without a socket

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use cloudsnap::api::{build_router, AppState};
use cloudsnap::index::{IndexEntry, SemanticIndex};
use cloudsnap::ingest::IngestConfig;
use cloudsnap::{Config, Error};
use common::{EchoCaptioner, KeywordEmbedder, MemoryLibrary};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::assert_ok;
use tower::ServiceExt;

const PHOTOS: &[(&str, &str)] = &[
    ("a.jpg", "dog on beach"),
    ("b.jpg", "cat on sofa"),
    ("c.jpg", "dog in park"),
];

fn app() -> (Router, SemanticIndex) {
    let config = Config {
        ingest: IngestConfig { throttle_ms: 0 },
        ..Default::default()
    };
    let index = SemanticIndex::new(Arc::new(KeywordEmbedder::default()));
    let state = AppState::new(
        index.clone(),
        Arc::new(EchoCaptioner::default()),
        Arc::new(MemoryLibrary::new(PHOTOS)),
        &config,
    );
    (build_router(state, &config.server), index)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn search_request(body: Value) -> Request<Body> {
    Request::post("/api/search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn sse_frames(body: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_reports_index_state() {
    let (app, _) = app();

    let (status, body) = send(&app, Request::get("/api/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    let health: Value = assert_ok!(serde_json::from_slice(&body));
    assert_eq!(health["status"], "OK");
    assert_eq!(health["smartSearchReady"], false);
    assert_eq!(health["photosProcessed"], 0);
    assert_eq!(health["ingestionRunning"], false);
}

#[tokio::test]
async fn test_process_embeddings_streams_progress() {
    let (app, index) = app();

    let request = Request::post("/api/process-embeddings").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let frames = sse_frames(&body);
    assert_eq!(frames.len(), 4);
    assert_eq!(
        frames[0],
        json!({"progress": 33, "processed": 1, "total": 3, "currentFile": "a.jpg"})
    );
    assert_eq!(frames[3]["complete"], true);
    assert_eq!(frames[3]["processed"], 3);
    assert_eq!(index.store().size(), 3);

    let (_, body) = send(&app, Request::get("/api/photos").body(Body::empty()).unwrap()).await;
    let photos: Value = assert_ok!(serde_json::from_slice(&body));
    assert_eq!(photos["smartSearchEnabled"], true);
    assert_eq!(photos["photos"][1]["filename"], "b.jpg");
    assert_eq!(photos["photos"][1]["hasEmbedding"], true);
    assert_eq!(photos["photos"][1]["description"], "cat on sofa");
    assert_eq!(photos["photos"][1]["path"], "/uploads/b.jpg");
}

#[tokio::test]
async fn test_search_requires_query() {
    let (app, _) = app();

    let (status, body) = send(&app, search_request(json!({"query": "  ", "useSmartSearch": true}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert_eq!(error["message"], "Search query required");
}

#[tokio::test]
async fn test_smart_search_after_ingestion() {
    let (app, _) = app();
    send(&app, Request::post("/api/process-embeddings").body(Body::empty()).unwrap()).await;

    let (status, body) = send(&app, search_request(json!({"query": "dog", "useSmartSearch": true}))).await;

    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["query"], "dog");
    assert_eq!(response["searchType"], "smart");

    let results = response["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["filename"], "a.jpg");
    assert!(results.iter().all(|r| r["confidence"].is_number()));
}

#[tokio::test]
async fn test_smart_search_on_empty_index_reports_basic() {
    let (app, _) = app();

    let (status, body) = send(&app, search_request(json!({"query": "dog", "useSmartSearch": true}))).await;

    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["searchType"], "basic");
    assert_eq!(response["results"].as_array().unwrap().len(), 3);
    assert!(response["results"][0].get("confidence").is_none());
}

#[tokio::test]
async fn test_inconsistent_index_is_rejected() {
    let (app, index) = app();
    index
        .store()
        .put("x.jpg", IndexEntry::new("x.jpg", "/uploads/x.jpg", "dog", vec![1.0, 2.0]));

    let (status, body) = send(&app, search_request(json!({"query": "dog", "useSmartSearch": true}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "PRECONDITION_FAILED");
}

#[tokio::test]
async fn test_metrics_endpoint_exports_text() {
    let (app, _) = app();

    let (status, body) = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("index_entries"));
}

#[tokio::test]
async fn test_from_config_creates_uploads_dir() {
    let dir = std::env::temp_dir().join(format!("cloudsnap-state-{}", uuid::Uuid::new_v4()));
    let mut config = Config::default();
    config.library.uploads_dir = dir.join("uploads");

    let state = assert_ok!(AppState::from_config(&config).await);

    assert!(config.library.uploads_dir.is_dir());
    assert!(!state.index.is_ready());
    assert!(!state.pipeline.is_running());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_from_config_reports_unusable_uploads_dir() {
    let file = std::env::temp_dir().join(format!("cloudsnap-file-{}", uuid::Uuid::new_v4()));
    std::fs::write(&file, b"not a directory").unwrap();
    let mut config = Config::default();
    config.library.uploads_dir = file.join("uploads");

    let result = AppState::from_config(&config).await;

    assert!(matches!(result, Err(Error::Library(_))));
    std::fs::remove_file(&file).unwrap();
}
