//! Integration tests for `OpenAiClient` and `SummaryGenerator` using wiremock
//! HTTP mocks.

use reviewsum_llm::{
    CompletionClient, GenerationError, OpenAiClient, SummaryGenerator, TiktokenEstimator,
};
use rust_decimal::Decimal;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenAiClient {
    OpenAiClient::with_base_url("test-key", 30, base_url)
        .expect("client construction should not fail")
}

fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo-0125",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ],
        "usage": { "prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160 }
    })
}

fn generator(base_url: &str) -> SummaryGenerator<OpenAiClient, TiktokenEstimator> {
    SummaryGenerator::new(
        test_client(base_url),
        TiktokenEstimator::cl100k().expect("tokenizer"),
        "gpt-3.5-turbo-0125",
    )
}

#[tokio::test]
async fn generate_sends_expected_request_and_returns_summary() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-3.5-turbo-0125",
            "temperature": 0.0,
            "top_p": 1.0,
            "n": 1,
            "max_tokens": 1200,
            "presence_penalty": 0.0,
            "frequency_penalty": 0.0
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("- Top-tier coaching.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reviews = vec!["Great coaches!".to_string(), "Friendly staff".to_string()];
    let summary = generator(&server.uri())
        .generate(&reviews, 4, Decimal::new(425, 2))
        .await
        .expect("should return summary");

    assert_eq!(summary, "- Top-tier coaching.");
}

#[tokio::test]
async fn user_message_carries_statistics_and_reviews() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .mount(&server)
        .await;

    let reviews = vec!["Great coaches!".to_string(), "Friendly staff".to_string()];
    generator(&server.uri())
        .generate(&reviews, 4, Decimal::new(425, 2))
        .await
        .expect("should return summary");

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    let user = messages[1]["content"].as_str().unwrap();
    assert!(user.starts_with("Reviews:\nTotal Rating:4\nAverage rating:4.25\n"));
    assert!(user.contains("Great coaches!\nFriendly staff\n"));
    assert!(user.ends_with("Summary:"));
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let err = generator(&server.uri())
        .generate(&["Nice".to_string()], 1, Decimal::from(5))
        .await
        .unwrap_err();

    match err {
        GenerationError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_envelope_keeps_raw_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = generator(&server.uri())
        .generate(&["Nice".to_string()], 1, Decimal::from(5))
        .await
        .unwrap_err();

    assert!(
        matches!(err, GenerationError::Api { status: 503, ref message } if message == "upstream unavailable"),
        "got: {err:?}"
    );
    assert!(reviewsum_llm::is_retriable(&err));
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": []
        })))
        .mount(&server)
        .await;

    let err = generator(&server.uri())
        .generate(&["Nice".to_string()], 1, Decimal::from(5))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::EmptyCompletion), "got: {err:?}");
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let request = reviewsum_llm::ChatRequest {
        model: "gpt-3.5-turbo-0125".to_string(),
        messages: vec![reviewsum_llm::ChatMessage::user("hi")],
        temperature: 0.0,
        max_tokens: 10,
        top_p: 1.0,
        n: 1,
        presence_penalty: 0.0,
        frequency_penalty: 0.0,
    };
    let err = test_client(&server.uri()).complete(&request).await.unwrap_err();

    assert!(matches!(err, GenerationError::Deserialize { .. }), "got: {err:?}");
}

#[tokio::test]
async fn base_url_with_v1_suffix_hits_same_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/v1/", server.uri());
    let summary = generator(&base)
        .generate(&["Nice".to_string()], 1, Decimal::from(5))
        .await
        .unwrap();

    assert_eq!(summary, "ok");
}
