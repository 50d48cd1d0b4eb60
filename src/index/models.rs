//! Data models for the semantic index

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-length vector produced by the text embedder
pub type Embedding = Vec<f32>;

/// One stored photo, as reported by the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identity, the storage file name
    pub id: String,
    /// Public location the photo can be fetched from
    pub path: String,
    /// Size in bytes
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Semantic record for one photo.
///
/// Only ever built once both the caption and its embedding are available, so
/// the store never holds a caption without a vector or the reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub path: String,
    pub caption: String,
    pub embedding: Embedding,
    pub processed_at: DateTime<Utc>,
}

impl IndexEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        caption: impl Into<String>,
        embedding: Embedding,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            caption: caption.into(),
            embedding,
            processed_at: Utc::now(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Case-insensitive substring match against the caption
    pub fn caption_contains(&self, needle_lower: &str) -> bool {
        self.caption.to_lowercase().contains(needle_lower)
    }
}
