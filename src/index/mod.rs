//! Semantic index: vector store, similarity ranking and the embedding path
//!
//! [`SemanticIndex`] pairs the store with the one embedder used for both
//! captions at ingestion time and queries at search time. Ingestion and search
//! are built from the same `SemanticIndex`, so they cannot embed into
//! different vector spaces.

pub mod models;
pub mod similarity;
pub mod store;

pub use models::{Embedding, IndexEntry, Item};
pub use similarity::{cosine_similarity, rank_top_k, validate_vector, SimilarityError};
pub use store::VectorStore;

use crate::upstream::{Embedder, UpstreamError};
use std::sync::Arc;

#[derive(Clone)]
pub struct SemanticIndex {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
}

impl SemanticIndex {
    /// Create an index with an empty store
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_store(VectorStore::new(), embedder)
    }

    pub fn with_store(store: VectorStore, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Embed text for either indexing or querying
    pub async fn embed(&self, text: &str) -> Result<Embedding, UpstreamError> {
        self.embedder.embed(text).await
    }

    pub fn is_ready(&self) -> bool {
        !self.store.is_empty()
    }
}
