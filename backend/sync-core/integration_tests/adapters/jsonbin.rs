use super::{build, json_body, requests};
use crate::helpers::{MockHost, sets_with};

use sync_core::error::storage::ID_NON_EXIST_ERROR;
use sync_core::storage::{AdapterFactory, AdapterOptions, DefaultAdapterFactory, SaveRequest};
use sync_core::store::TokenStore;
use sync_core::sync::{PullOutcome, SyncHost, SyncOrchestrator, SyncSettings};

use models::{RemoteTokenData, StorageProvider, SyncContext};

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bin_context(server: &MockServer, id: &str) -> SyncContext {
    SyncContext::new(StorageProvider::JsonBin, id)
        .with_name("Design tokens")
        .with_base_url(server.uri())
        .with_secret("master-key")
}

fn stored_record() -> Value {
    json!({
        "record": {
            "version": "1",
            "updatedAt": "2024-06-01T12:00:00Z",
            "values": {
                "global": [
                    { "name": "sizing.xs", "type": "sizing", "value": 4 },
                    { "name": "sizing.sm", "type": "sizing", "value": "$sizing.xs * 2" },
                ],
            },
            "$themes": [],
            "$metadata": { "tokenSetOrder": ["global"] },
        },
    })
}

#[tokio::test]
async fn given_stored_record_when_retrieving_then_returns_values_and_timestamp() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/bin-1/latest"))
        .and(header("x-master-key", "master-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_record()))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&bin_context(&server, "bin-1"));

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    let remote = remote.expect("record has values");
    assert_eq!(remote.tokens, sets_with(4));
    assert_eq!(remote.updated_at.as_deref(), Some("2024-06-01T12:00:00Z"));
}

#[tokio::test]
async fn given_unknown_bin_when_retrieving_then_id_does_not_exist() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/missing/latest"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let adapter = build(&bin_context(&server, "missing"));

    // WHEN
    let error = adapter.retrieve().await.expect_err("unknown bin");

    // THEN
    assert_eq!(error.error_message(), ID_NON_EXIST_ERROR);
}

#[tokio::test]
async fn given_fresh_bin_without_values_when_retrieving_then_empty() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/bin-1/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "record": { "version": "1" } })))
        .mount(&server)
        .await;
    let adapter = build(&bin_context(&server, "bin-1"));

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    assert!(remote.is_none());
}

#[tokio::test]
async fn given_no_bin_id_when_retrieving_then_fails_without_request() {
    // GIVEN
    let server = MockServer::start().await;
    let adapter = build(&bin_context(&server, ""));

    // WHEN
    let error = adapter.retrieve().await.expect_err("id required");

    // THEN
    assert_eq!(error.error_message(), ID_NON_EXIST_ERROR);
    assert!(requests(&server, "GET").await.is_empty());
}

#[tokio::test]
async fn given_tokens_when_saving_then_record_is_replaced() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/b/bin-1"))
        .and(header("x-master-key", "master-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&bin_context(&server, "bin-1"));

    // WHEN
    adapter
        .save(&SaveRequest {
            branch: String::from("main"),
            data: RemoteTokenData::new(sets_with(4)).with_updated_at("2024-06-02T09:00:00Z"),
            message: String::from("Update tokens"),
        })
        .await
        .expect("save succeeds");

    // THEN
    let body = json_body(&requests(&server, "PUT").await[0]);
    assert_eq!(body["version"], json!("1"));
    assert_eq!(body["updatedAt"], json!("2024-06-02T09:00:00Z"));
    assert_eq!(body["values"]["global"][0]["name"], json!("sizing.xs"));
    assert_eq!(body["$metadata"], json!({ "tokenSetOrder": ["global"] }));
}

#[tokio::test]
async fn given_name_when_creating_storage_then_returns_new_bin_id() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/b"))
        .and(header("x-bin-name", "Design tokens"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "metadata": { "id": "bin-new" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&bin_context(&server, ""));

    // WHEN
    let id = adapter.create_storage("Design tokens").await.expect("create succeeds");

    // THEN
    assert_eq!(id.as_deref(), Some("bin-new"));
}

/// **VALUE**: The real adapter stack behind the orchestrator, end to end.
#[tokio::test]
async fn given_bin_with_tokens_when_pulling_into_empty_store_then_tokens_resolve() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/bin-1/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_record()))
        .mount(&server)
        .await;
    let orchestrator = SyncOrchestrator::new(
        TokenStore::new(),
        Arc::new(DefaultAdapterFactory::new(AdapterOptions::default())) as Arc<dyn AdapterFactory>,
        Arc::new(MockHost::new()) as Arc<dyn SyncHost>,
        SyncSettings::default(),
    );

    // WHEN
    let outcome = orchestrator
        .pull(&bin_context(&server, "bin-1"))
        .await
        .expect("pull succeeds");

    // THEN
    assert_eq!(outcome, PullOutcome::Applied);
    let resolved = orchestrator.store().snapshot().await.resolve();
    assert_eq!(resolved["sizing.sm"].value, json!(8));
}
