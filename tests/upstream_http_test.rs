//! Captioning and embedding clients against a mock OpenAI-compatible server

use cloudsnap::upstream::{
    BreakerState, Captioner, Embedder, OpenAiCaptioner, OpenAiEmbedder, UpstreamConfig, UpstreamError,
};
use mockito::{Matcher, Server};
use secrecy::SecretString;
use serde_json::json;

fn config(server: &Server) -> UpstreamConfig {
    UpstreamConfig {
        base_url: server.url(),
        api_key: Some(SecretString::new("test-key".to_string())),
        timeout_ms: 2_000,
        ..Default::default()
    }
}

fn chat_reply(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

fn embedding_reply(embedding: &[f32]) -> String {
    json!({"data": [{"index": 0, "embedding": embedding}], "model": "text-embedding-ada-002"}).to_string()
}

#[tokio::test]
async fn test_caption_sends_inline_image() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"model": "gpt-4o-mini", "max_tokens": 300})),
            Matcher::Regex("data:image/png;base64,aGVsbG8=".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("  A brown dog running on a sandy beach.  "))
        .create_async()
        .await;

    let captioner = OpenAiCaptioner::new(config(&server)).unwrap();
    let caption = captioner.caption(b"hello", "image/png").await.unwrap();

    assert_eq!(caption, "A brown dog running on a sandy beach.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_caption_error_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("rate limited")
        .create_async()
        .await;

    let captioner = OpenAiCaptioner::new(config(&server)).unwrap();
    let result = captioner.caption(b"img", "image/jpeg").await;

    match result {
        Err(UpstreamError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(captioner.breaker().consecutive_failures(), 1);
}

#[tokio::test]
async fn test_caption_empty_content_is_invalid() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("   "))
        .create_async()
        .await;

    let captioner = OpenAiCaptioner::new(config(&server)).unwrap();
    let result = captioner.caption(b"img", "image/jpeg").await;

    assert!(matches!(result, Err(UpstreamError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_breaker_opens_after_repeated_failures() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let captioner = OpenAiCaptioner::new(UpstreamConfig {
        circuit_breaker_failures: 2,
        ..config(&server)
    })
    .unwrap();

    for _ in 0..2 {
        assert!(captioner.caption(b"img", "image/jpeg").await.is_err());
    }
    assert_eq!(captioner.breaker().state(), BreakerState::Open);

    let result = captioner.caption(b"img", "image/jpeg").await;
    assert!(matches!(result, Err(UpstreamError::CircuitOpen(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embed_returns_vector() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .match_body(Matcher::PartialJson(json!({
            "model": "text-embedding-ada-002",
            "input": "dog on beach"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(embedding_reply(&[0.25, -0.5, 0.75]))
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::new(config(&server)).unwrap();
    let vector = embedder.embed("dog on beach").await.unwrap();

    assert_eq!(vector, vec![0.25, -0.5, 0.75]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embed_rejects_zero_vector() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(embedding_reply(&[0.0, 0.0, 0.0]))
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::new(config(&server)).unwrap();
    let result = embedder.embed("dog").await;

    assert!(matches!(result, Err(UpstreamError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_embed_enforces_configured_dimensions() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(embedding_reply(&[0.1, 0.2]))
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::new(UpstreamConfig {
        embedding_dimensions: Some(1536),
        ..config(&server)
    })
    .unwrap();
    let result = embedder.embed("dog").await;

    match result {
        Err(UpstreamError::InvalidResponse(message)) => assert!(message.contains("1536")),
        other => panic!("expected invalid response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_embed_malformed_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": "nope"}"#)
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::new(config(&server)).unwrap();

    assert!(matches!(
        embedder.embed("dog").await,
        Err(UpstreamError::InvalidResponse(_))
    ));
}
