//! Vision captioner: image bytes to a searchable description

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::config::UpstreamConfig;
use super::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, ImageUrl};
use super::{build_http_client, post_json, UpstreamError};
use crate::metrics::METRICS;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use std::time::Instant;
use tracing::debug;

/// Prompt sent with every image. Search quality depends on how much of the
/// scene ends up in the caption, so it asks for every searchable aspect.
pub const CAPTION_PROMPT: &str = "Describe this image in detail. Include: people (relationships if apparent), \
location, activities, colors, clothing, objects, and any text visible. Be specific about \
distinguishing features that would help someone search for this photo later.";

/// Produces a natural-language caption for one image.
///
/// Implementations make a single attempt; retry policy belongs to the caller.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image: &[u8], media_type: &str) -> Result<String, UpstreamError>;
}

/// Captioner backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiCaptioner {
    http: Client,
    config: UpstreamConfig,
    breaker: CircuitBreaker,
}

impl OpenAiCaptioner {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = build_http_client(&config)?;
        let breaker = CircuitBreaker::new(
            "vision",
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

    async fn call_vision_api(&self, image: &[u8], media_type: &str) -> Result<String, UpstreamError> {
        let data_url = format!("data:{};base64,{}", media_type, STANDARD.encode(image));

        let request = ChatCompletionRequest {
            model: &self.config.vision_model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: CAPTION_PROMPT },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url,
                            detail: &self.config.image_detail,
                        },
                    },
                ],
            }],
            max_tokens: self.config.caption_max_tokens,
        };

        debug!(
            "Calling vision API: model={}, bytes={}",
            self.config.vision_model,
            image.len()
        );

        let response: ChatCompletionResponse =
            post_json(&self.http, &self.config, "chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| UpstreamError::InvalidResponse("response contained no caption".to_string()))
    }
}

#[async_trait]
impl Captioner for OpenAiCaptioner {
    async fn caption(&self, image: &[u8], media_type: &str) -> Result<String, UpstreamError> {
        if self.breaker.is_open() {
            METRICS.record_upstream("vision", "circuit_open", None);
            return Err(UpstreamError::CircuitOpen(self.breaker.service()));
        }

        let start = Instant::now();
        let result = self.call_vision_api(image, media_type).await;

        match &result {
            Ok(_) => {
                self.breaker.mark_success();
                METRICS.record_upstream("vision", "success", Some(start.elapsed()));
            }
            Err(e) => {
                self.breaker.mark_failure();
                METRICS.record_upstream("vision", e.kind(), Some(start.elapsed()));
            }
        }

        result
    }
}
