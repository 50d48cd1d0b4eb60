//! Configuration for the vision and embedding services

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Settings shared by the OpenAI-compatible captioning and embedding clients
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible API, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (read from env OPENAI_API_KEY if not set)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Model used to caption images
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Token cap for one caption
    #[serde(default = "default_caption_max_tokens")]
    pub caption_max_tokens: u32,

    /// Image detail hint passed with the picture ("low", "high", "auto")
    #[serde(default = "default_image_detail")]
    pub image_detail: String,

    /// Model used to embed captions and queries
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Expected embedding length; responses of any other length are rejected
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Consecutive failures before a client stops calling upstream
    #[serde(default = "default_breaker_failures")]
    pub circuit_breaker_failures: usize,

    /// Seconds before a tripped client tries upstream again
    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset_secs: u64,

    /// Number of embeddings kept in memory. Captions embedded during
    /// ingestion and search queries share this cache.
    #[serde(default = "default_embedding_cache_size")]
    pub embedding_cache_size: u64,

    #[serde(default = "default_embedding_cache_ttl")]
    pub embedding_cache_ttl_secs: u64,
}

fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_vision_model() -> String { "gpt-4o-mini".to_string() }
fn default_caption_max_tokens() -> u32 { 300 }
fn default_image_detail() -> String { "high".to_string() }
fn default_embedding_model() -> String { "text-embedding-ada-002".to_string() }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_breaker_failures() -> usize { 5 }
fn default_breaker_reset() -> u64 { 30 }
fn default_embedding_cache_size() -> u64 { 256 }
fn default_embedding_cache_ttl() -> u64 { 600 }

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            vision_model: default_vision_model(),
            caption_max_tokens: default_caption_max_tokens(),
            image_detail: default_image_detail(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: None,
            timeout_ms: default_timeout_ms(),
            circuit_breaker_failures: default_breaker_failures(),
            circuit_breaker_reset_secs: default_breaker_reset(),
            embedding_cache_size: default_embedding_cache_size(),
            embedding_cache_ttl_secs: default_embedding_cache_ttl(),
        }
    }
}

impl UpstreamConfig {
    /// Apply overrides from the conventional environment variables
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if !val.is_empty() {
                self.api_key = Some(SecretString::new(val));
            }
        }

        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.base_url = val;
        }

        if let Ok(val) = std::env::var("VISION_MODEL") {
            self.vision_model = val;
        }

        if let Ok(val) = std::env::var("EMBEDDING_MODEL") {
            self.embedding_model = val;
        }

        if let Ok(val) = std::env::var("UPSTREAM_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                self.timeout_ms = timeout;
            }
        }

        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn breaker_reset_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_secs)
    }

    pub fn embedding_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.embedding_cache_ttl_secs)
    }

    /// Endpoint URL for an API path such as `chat/completions`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}
