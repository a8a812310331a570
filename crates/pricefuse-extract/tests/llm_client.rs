//! Integration tests for `OpenAiClient` against a mock chat-completions API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricefuse_extract::{LlmBackend, LlmFields, LlmMetadata, OpenAiClient};

fn test_client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new("sk-test", "gpt-4o-mini", &server.uri(), Duration::from_secs(5))
        .expect("failed to build test OpenAiClient")
        .with_retries(1, 0)
}

fn metadata() -> LlmMetadata {
    LlmMetadata {
        url: "https://shop.example.com/p/lamp".to_owned(),
        price_strings: vec!["$19.99".to_owned()],
        ..LlmMetadata::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn parses_json_reply_into_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": { "type": "json_object" },
            "max_tokens": 300
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"product_title":"Desk Lamp","original_price":"29.99","sale_price":"19.99"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let fields = test_client(&server)
        .extract("Desk Lamp $19.99 was $29.99", &metadata(), None)
        .await;
    assert_eq!(
        fields,
        Some(LlmFields {
            product_title: Some("Desk Lamp".to_owned()),
            original_price: Some("29.99".to_owned()),
            sale_price: Some("19.99".to_owned()),
        })
    );
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"product_title":"Lamp"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let fields = test_client(&server).extract("Lamp", &metadata(), None).await.unwrap();
    assert_eq!(fields.product_title.as_deref(), Some("Lamp"));
    assert_eq!(fields.sale_price, None);
}

#[tokio::test]
async fn client_errors_are_not_retried_and_mean_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    assert!(test_client(&server).extract("Lamp", &metadata(), None).await.is_none());
}

#[tokio::test]
async fn non_json_reply_means_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("I could not find a price.")))
        .mount(&server)
        .await;

    assert!(test_client(&server).extract("Lamp", &metadata(), None).await.is_none());
}

#[tokio::test]
async fn screenshot_is_sent_as_data_url() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let shot = dir.path().join("page.png");
    std::fs::write(&shot, b"png-bytes").unwrap();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system" },
                { "role": "user", "content": [
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,cG5nLWJ5dGVz" } },
                    { "type": "text" }
                ]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"sale_price":"5.00"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let fields = test_client(&server)
        .extract("Mug", &metadata(), Some(&shot))
        .await
        .unwrap();
    assert_eq!(fields.sale_price.as_deref(), Some("5.00"));
}

#[tokio::test]
async fn completion_without_choices_means_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "chatcmpl-2", "choices": [] })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(test_client(&server).extract("Lamp", &metadata(), None).await.is_none());
}
