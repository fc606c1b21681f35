//! Wire-level tests for the Ollama backend using a mock HTTP server.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pulse_core::{CompletionBackend, EmbeddingBackend};
use pulse_inference::OllamaBackend;

fn backend_for(server: &MockServer) -> OllamaBackend {
    OllamaBackend::with_config(
        server.uri(),
        "llama3.1:8b".to_string(),
        "nomic-embed-text".to_string(),
        4,
    )
}

#[tokio::test]
async fn complete_parses_chat_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "Your BP was 138/88." },
            "prompt_eval_count": 42,
            "eval_count": 12
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let completion = backend
        .complete("You are a health coach.", "What was my BP yesterday?")
        .await
        .unwrap();

    assert_eq!(completion.text, "Your BP was 138/88.");
    assert_eq!(completion.model, "llama3.1:8b");
    assert_eq!(completion.input_tokens, 42);
    assert_eq!(completion.output_tokens, 12);
    assert_eq!(completion.total_tokens(), 54);
}

#[tokio::test]
async fn complete_surfaces_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.complete("", "hello").await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn embed_texts_parses_vectors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3, 0.4], [0.5, 0.6, 0.7, 0.8]]
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let vectors = backend
        .embed_texts(&["day one".to_string(), "day two".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].as_slice(), &[0.1, 0.2, 0.3, 0.4]);
}

#[tokio::test]
async fn embed_empty_input_skips_request() {
    let server = MockServer::start().await;
    // No mock mounted: any request would 404 and fail the call.

    let backend = backend_for(&server);
    let vectors = backend.embed_texts(&[]).await.unwrap();
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn availability_follows_tags_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    assert!(backend.is_available().await);
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let backend = OllamaBackend::with_config(
        "http://127.0.0.1:1".to_string(),
        "llama3.1:8b".to_string(),
        "nomic-embed-text".to_string(),
        4,
    );
    assert!(!backend.is_available().await);
}
