//! Clients for the external vision and embedding services
//!
//! Both services speak the OpenAI-compatible HTTP API:
//! - `POST {base_url}/chat/completions` with an inline image, for captions
//! - `POST {base_url}/embeddings`, for caption and query vectors

pub mod cache;
pub mod captioner;
pub mod circuit_breaker;
pub mod config;
pub mod embedder;
pub mod error;
pub(crate) mod models;

pub use cache::CachedEmbedder;
pub use captioner::{Captioner, OpenAiCaptioner, CAPTION_PROMPT};
pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerConfig};
pub use config::UpstreamConfig;
pub use embedder::{Embedder, OpenAiEmbedder};
pub use error::UpstreamError;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

pub(crate) fn build_http_client(config: &UpstreamConfig) -> Result<Client, UpstreamError> {
    if config.api_key.is_none() {
        warn!("No upstream API key configured; requests are sent unauthenticated");
    }

    Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| UpstreamError::RequestFailed(e.to_string()))
}

/// POST a JSON body and decode a JSON response, mapping non-2xx to an error
pub(crate) async fn post_json<B, R>(
    http: &Client,
    config: &UpstreamConfig,
    path: &str,
    body: &B,
) -> Result<R, UpstreamError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut req = http.post(config.endpoint(path)).json(body);

    if let Some(api_key) = &config.api_key {
        req = req.bearer_auth(api_key.expose_secret());
    }

    let response = req.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
}
