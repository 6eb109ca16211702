use super::{build, token_document};
use crate::helpers::sets_with;

use sync_core::storage::{AdapterFactory, AdapterOptions, DefaultAdapterFactory, SaveRequest};

use models::{RemoteTokenData, StorageProvider, SyncContext};

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url_context(server: &MockServer) -> SyncContext {
    SyncContext::new(StorageProvider::Url, format!("{}/tokens.json", server.uri()))
}

#[tokio::test]
async fn given_header_secret_when_retrieving_then_headers_are_sent() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokens.json"))
        .and(header("authorization", "Bearer abc"))
        .and(header("x-team", "design"))
        .respond_with(ResponseTemplate::new(200).set_body_string(token_document()))
        .expect(1)
        .mount(&server)
        .await;
    let context = url_context(&server)
        .with_secret(r#"{"Authorization": "Bearer abc", "X-Team": "design"}"#);
    let adapter = build(&context);

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    assert_eq!(remote.expect("document has tokens").tokens, sets_with(4));
}

#[tokio::test]
async fn given_record_shaped_payload_when_retrieving_then_values_are_read() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokens.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updatedAt": "2024-06-01T12:00:00Z",
            "values": {
                "global": [
                    { "name": "sizing.xs", "type": "sizing", "value": 4 },
                    { "name": "sizing.sm", "type": "sizing", "value": "$sizing.xs * 2" },
                ],
            },
        })))
        .mount(&server)
        .await;
    let adapter = build(&url_context(&server));

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    let remote = remote.expect("record has values");
    assert_eq!(remote.tokens, sets_with(4));
    assert_eq!(remote.updated_at.as_deref(), Some("2024-06-01T12:00:00Z"));
}

#[tokio::test]
async fn given_empty_object_when_retrieving_then_empty() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokens.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    let adapter = build(&url_context(&server));

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    assert!(remote.is_none());
}

#[tokio::test]
async fn given_server_error_when_retrieving_then_general_connection_error() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let adapter = build(&url_context(&server));

    // WHEN
    let error = adapter.retrieve().await.expect_err("500 fails");

    // THEN
    assert_eq!(error.error_message(), "GENERAL_CONNECTION_ERROR");
}

#[test]
fn given_secret_that_is_not_json_when_building_then_url_credential_error() {
    // GIVEN
    let context = SyncContext::new(StorageProvider::Url, "https://tokens.example.com/tokens.json")
        .with_secret("Bearer abc");

    // WHEN
    let error = DefaultAdapterFactory::new(AdapterOptions::default())
        .create(&context)
        .err()
        .expect("secret must be a header object");

    // THEN
    assert_eq!(error.error_message(), "URL_CREDENTIAL_ERROR");
}

#[tokio::test]
async fn given_url_storage_when_saving_then_read_only() {
    // GIVEN
    let server = MockServer::start().await;
    let adapter = build(&url_context(&server));

    // WHEN
    let error = adapter
        .save(&SaveRequest {
            branch: String::from("main"),
            data: RemoteTokenData::new(sets_with(4)),
            message: String::from("Update tokens"),
        })
        .await
        .expect_err("read only");

    // THEN
    assert_eq!(error.error_message(), "URL_CREDENTIAL_ERROR");
    assert!(!adapter.can_write().await.expect("check succeeds"));
}
