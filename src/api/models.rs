//! Request and response bodies for the HTTP API

use crate::search::SearchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Search request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub use_smart_search: bool,
}

/// Search response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Mode actually used: "smart" or "basic"
    pub search_type: String,
}

/// One stored photo and its index state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSummary {
    pub filename: String,
    pub path: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    pub has_embedding: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosResponse {
    pub photos: Vec<PhotoSummary>,
    pub smart_search_enabled: bool,
}

/// Health and index status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub smart_search_ready: bool,
    pub photos_processed: usize,
    pub ingestion_running: bool,
}

/// API error details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Standard error codes
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const PRECONDITION_FAILED: &str = "PRECONDITION_FAILED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_request_defaults_to_basic() {
        let request: SearchRequest = serde_json::from_value(json!({"query": "dog"})).unwrap();
        assert_eq!(request.query, "dog");
        assert!(!request.use_smart_search);
    }

    #[test]
    fn test_search_request_camel_case() {
        let request: SearchRequest =
            serde_json::from_value(json!({"query": "dog", "useSmartSearch": true})).unwrap();
        assert!(request.use_smart_search);
    }

    #[test]
    fn test_search_response_omits_missing_confidence() {
        let response = SearchResponse {
            success: true,
            query: "dog".to_string(),
            results: vec![SearchResult {
                filename: "a.jpg".to_string(),
                path: "/uploads/a.jpg".to_string(),
                caption: "a dog".to_string(),
                confidence: None,
            }],
            search_type: "basic".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["searchType"], "basic");
        assert!(value["results"][0].get("confidence").is_none());
    }
}
