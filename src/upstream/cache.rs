//! TTL cache in front of an embedder

use super::embedder::Embedder;
use super::UpstreamError;
use crate::index::Embedding;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Wraps an embedder and remembers vectors by exact input text.
///
/// Caption embeddings from ingestion and query embeddings from search go
/// through the same cache. Repeated text skips the network round trip.
/// Failures are not cached.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Cache<String, Arc<Embedding>>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, UpstreamError> {
        if let Some(hit) = self.cache.get(text).await {
            debug!("Embedding cache hit");
            return Ok(hit.as_ref().clone());
        }

        let embedding = self.inner.embed(text).await?;
        self.cache
            .insert(text.to_string(), Arc::new(embedding.clone()))
            .await;
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Embedding, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::RequestFailed("down".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[tokio::test]
    async fn test_repeated_text_hits_cache() {
        let inner = Arc::new(CountingEmbedder { calls: AtomicUsize::new(0), fail: false });
        let cached = CachedEmbedder::new(inner.clone(), 16, Duration::from_secs(60));

        let first = cached.embed("dog").await.unwrap();
        let second = cached.embed("dog").await.unwrap();
        cached.embed("cat on sofa").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(CountingEmbedder { calls: AtomicUsize::new(0), fail: true });
        let cached = CachedEmbedder::new(inner.clone(), 16, Duration::from_secs(60));

        assert!(cached.embed("dog").await.is_err());
        assert!(cached.embed("dog").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
