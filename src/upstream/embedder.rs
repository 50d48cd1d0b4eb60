//! Text embedder: text to a fixed-length vector

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::config::UpstreamConfig;
use super::models::{EmbeddingRequest, EmbeddingResponse};
use super::{build_http_client, post_json, UpstreamError};
use crate::index::{validate_vector, Embedding};
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::debug;

/// Maps text to an embedding.
///
/// On success the vector is complete, finite and non-zero; on failure no
/// vector is returned at all.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, UpstreamError>;
}

/// Embedder backed by an OpenAI-compatible embeddings endpoint
pub struct OpenAiEmbedder {
    http: Client,
    config: UpstreamConfig,
    breaker: CircuitBreaker,
}

impl OpenAiEmbedder {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = build_http_client(&config)?;
        let breaker = CircuitBreaker::new(
            "embedding",
            CircuitBreakerConfig {
                failure_threshold: config.circuit_breaker_failures,
                reset_timeout: config.breaker_reset_timeout(),
            },
        );

        Ok(Self { http, config, breaker })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn call_embedding_api(&self, text: &str) -> Result<Embedding, UpstreamError> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        debug!(
            "Calling embedding API: model={}, chars={}",
            self.config.embedding_model,
            text.len()
        );

        let response: EmbeddingResponse =
            post_json(&self.http, &self.config, "embeddings", &request).await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| UpstreamError::InvalidResponse("response contained no embedding".to_string()))?;

        validate_vector(&embedding)
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        if let Some(expected) = self.config.embedding_dimensions {
            if embedding.len() != expected {
                return Err(UpstreamError::InvalidResponse(format!(
                    "expected {} dimensions, got {}",
                    expected,
                    embedding.len()
                )));
            }
        }

        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, UpstreamError> {
        if text.trim().is_empty() {
            return Err(UpstreamError::EmptyInput);
        }

        if self.breaker.is_open() {
            METRICS.record_upstream("embedding", "circuit_open", None);
            return Err(UpstreamError::CircuitOpen(self.breaker.service()));
        }

        let start = Instant::now();
        let result = self.call_embedding_api(text).await;

        match &result {
            Ok(_) => {
                self.breaker.mark_success();
                METRICS.record_upstream("embedding", "success", Some(start.elapsed()));
            }
            Err(e) => {
                self.breaker.mark_failure();
                METRICS.record_upstream("embedding", e.kind(), Some(start.elapsed()));
            }
        }

        result
    }
}
