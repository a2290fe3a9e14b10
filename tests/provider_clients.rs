//! HTTP provider clients against mock servers

use mockito::Matcher;
use school_assistant::{
    config::{Config, EmbeddingConfig, GenerationConfig, GenerationProvider},
    embedding::{Embedder, EmbeddingError, HttpEmbedder},
    generation::{GeminiClient, GenerationError, Generator, OpenAiClient},
    school_knowledge_base, ConversationSession, Role, SchoolAssistant,
};
use secrecy::SecretString;
use serde_json::json;

fn gemini_config(base_url: &str) -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.api_url = Some(base_url.to_string());
    config.api_key = Some(SecretString::new("test-key".to_string()));
    config.model = Some("gemini-test".to_string());
    config.retry_backoff_ms = 1;
    config
}

fn openai_config(endpoint: &str) -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.provider = GenerationProvider::OpenAi;
    config.api_url = Some(endpoint.to_string());
    config.api_key = Some(SecretString::new("sk-test".to_string()));
    config.model = Some("gpt-test".to_string());
    config
}

#[tokio::test]
async fn test_gemini_generate_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"role": "user", "parts": [{"text": "Is there pizza?"}]}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Yes! Pizza is served every Friday.\n"}]},"finishReason":"STOP"}]}"#,
        )
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let text = client.generate("Is there pizza?").await.unwrap();

    assert_eq!(text, "Yes! Pizza is served every Friday.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_sends_configured_temperature() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"temperature": 0.5}
        })))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#)
        .create_async()
        .await;

    let mut config = gemini_config(&server.url());
    config.temperature = Some(0.5);
    let client = GeminiClient::new(&config).unwrap();

    assert_eq!(client.generate("q").await.unwrap(), "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_error_message_is_extracted() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#)
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let err = client.generate("q").await.unwrap_err();

    match err {
        GenerationError::UpstreamError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_gemini_blocked_prompt() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(200)
        .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, GenerationError::Blocked(reason) if reason == "SAFETY"));
}

#[tokio::test]
async fn test_gemini_retries_server_errors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(503)
        .with_body("unavailable")
        .expect(3)
        .create_async()
        .await;

    let mut config = gemini_config(&server.url());
    config.retry_attempts = 2;
    let client = GeminiClient::new(&config).unwrap();
    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, GenerationError::UpstreamError { status: 503, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_client_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(403)
        .with_body(r#"{"error":{"message":"forbidden"}}"#)
        .expect(1)
        .create_async()
        .await;

    let mut config = gemini_config(&server.url());
    config.retry_attempts = 3;
    let client = GeminiClient::new(&config).unwrap();

    assert!(client.generate("q").await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, GenerationError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_provider_is_request_failure() {
    let client = GeminiClient::new(&gemini_config("http://127.0.0.1:1")).unwrap();
    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(
        err,
        GenerationError::RequestFailed(_) | GenerationError::Timeout(_)
    ));
}

#[tokio::test]
async fn test_openai_generate_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-test",
            "messages": [{"role": "user", "content": "Who is the principal?"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Dr. Sarah Smith is the principal."}}]}"#)
        .create_async()
        .await;

    let endpoint = format!("{}/v1/chat/completions", server.url());
    let client = OpenAiClient::new(&openai_config(&endpoint)).unwrap();
    let text = client.generate("Who is the principal?").await.unwrap();

    assert_eq!(text, "Dr. Sarah Smith is the principal.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#)
        .create_async()
        .await;

    let endpoint = format!("{}/v1/chat/completions", server.url());
    let client = OpenAiClient::new(&openai_config(&endpoint)).unwrap();
    let err = client.generate("q").await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.to_string(), "Upstream error (status 429): Rate limit reached");
}

#[tokio::test]
async fn test_http_embedder_orders_by_index() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/embeddings")
        .match_header("authorization", "Bearer embed-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "embed-test",
            "input": ["first", "second"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#)
        .create_async()
        .await;

    let mut config = EmbeddingConfig::default();
    config.api_url = format!("{}/v1/embeddings", server.url());
    config.api_key = Some(SecretString::new("embed-key".to_string()));
    config.model = "embed-test".to_string();

    let embedder = HttpEmbedder::new(&config).unwrap();
    let vectors = embedder
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_embedder_count_mismatch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/embeddings")
        .with_status(200)
        .with_body(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#)
        .create_async()
        .await;

    let mut config = EmbeddingConfig::default();
    config.api_url = format!("{}/v1/embeddings", server.url());
    config.api_key = Some(SecretString::new("embed-key".to_string()));

    let embedder = HttpEmbedder::new(&config).unwrap();
    let err = embedder
        .embed(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_configured_assistant_answers_through_gemini() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .match_body(Matcher::Regex("8 AM to 4 PM".to_string()))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Yes! From 8 AM to 4 PM on weekdays."}]}}]}"#)
        .create_async()
        .await;

    let mut config = Config::default();
    config.generation = gemini_config(&server.url());

    let assistant = SchoolAssistant::from_config(&config, school_knowledge_base().unwrap())
        .await
        .unwrap();
    let mut session = ConversationSession::new();
    let reply = assistant
        .handle_turn(&mut session, "When is the library open?")
        .await
        .unwrap();

    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Yes! From 8 AM to 4 PM on weekdays.");
    mock.assert_async().await;
}
