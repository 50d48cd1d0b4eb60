//! Natural-language photo search
//!
//! Ladder, decided per query:
//! 1. Smart mode with a non-empty index: embed the query, rank entries by
//!    cosine similarity, attach confidences.
//! 2. Query embedding failed: case-insensitive substring match over captions.
//! 3. Basic mode or empty index: random sample of stored photos.

pub mod engine;

pub use engine::{SearchEngine, SearchOutcome, SearchStrategy};

use crate::index::SimilarityError;
use crate::library::LibraryError;
use serde::{Deserialize, Serialize};

/// Search mode, as requested by the caller or as actually used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Smart,
    Basic,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smart => "smart",
            Self::Basic => "basic",
        }
    }
}

/// One photo returned by a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub filename: String,
    pub path: String,
    pub caption: String,
    /// Cosine similarity; only set for similarity-ranked results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Search errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search query required")]
    EmptyQuery,

    /// The query vector cannot be ranked against the stored vectors
    #[error("Index is inconsistent: {0}")]
    Precondition(SimilarityError),

    #[error("Cannot list photos: {0}")]
    Library(#[from] LibraryError),
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum results per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Caption characters shown with similarity results
    #[serde(default = "default_smart_snippet_chars")]
    pub smart_snippet_chars: usize,

    /// Caption characters shown with keyword results
    #[serde(default = "default_keyword_snippet_chars")]
    pub keyword_snippet_chars: usize,
}

fn default_max_results() -> usize { 5 }
fn default_smart_snippet_chars() -> usize { 100 }
fn default_keyword_snippet_chars() -> usize { 150 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            smart_snippet_chars: default_smart_snippet_chars(),
            keyword_snippet_chars: default_keyword_snippet_chars(),
        }
    }
}
