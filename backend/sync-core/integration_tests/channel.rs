//! Request/response round trips through the plugin channel.

use crate::helpers::{MemoryDocument, MockAdapter, MockHost, context, harness, sets_with, store_with};

use sync_core::channel::{PluginRequest, PluginResponse, start_plugin_channel};
use sync_core::error::sync::EMPTY_BRANCH_ERROR;
use sync_core::sync::{DocumentStorage, PullOutcome, UpdatePayload};

use models::{RemoteTokenData, StorageProvider};

use std::sync::Arc;

use serde_json::json;

#[tokio::test]
async fn given_running_channel_when_resolving_then_returns_resolved_tokens() {
    // GIVEN
    let h = harness(store_with(sets_with(4)), MockAdapter::new(StorageProvider::GitHub), MockHost::new());
    let (client, _task) = start_plugin_channel(
        Arc::clone(&h.orchestrator),
        Arc::new(MemoryDocument::default()) as Arc<dyn DocumentStorage>,
    );

    // WHEN
    let response = client
        .request(PluginRequest::Resolve { theme: None })
        .await
        .expect("channel answers");

    // THEN
    let PluginResponse::Resolved(resolved) = response else {
        panic!("expected resolved tokens, got {response:?}");
    };
    assert_eq!(resolved["sizing.sm"].value, json!(8));
}

#[tokio::test]
async fn given_running_channel_when_pulling_then_outcome_comes_back() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::GitHub).with_remote(RemoteTokenData::new(sets_with(4)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    let (client, _task) = start_plugin_channel(
        Arc::clone(&h.orchestrator),
        Arc::new(MemoryDocument::default()) as Arc<dyn DocumentStorage>,
    );

    // WHEN
    let response = client
        .request(PluginRequest::Pull(context(StorageProvider::GitHub)))
        .await
        .expect("channel answers");

    // THEN
    assert!(matches!(
        response,
        PluginResponse::Pulled(PullOutcome::NothingToCommit)
    ));
}

#[tokio::test]
async fn given_failing_push_when_requested_then_response_carries_error_code() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitHub).with_branches(None);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    let (client, _task) = start_plugin_channel(
        Arc::clone(&h.orchestrator),
        Arc::new(MemoryDocument::default()) as Arc<dyn DocumentStorage>,
    );

    // WHEN
    let response = client
        .request(PluginRequest::Push(context(StorageProvider::GitHub)))
        .await
        .expect("channel answers");

    // THEN
    let PluginResponse::Failed { error_message } = response else {
        panic!("expected failure, got {response:?}");
    };
    assert_eq!(error_message, EMPTY_BRANCH_ERROR);
}

#[tokio::test]
async fn given_update_request_when_served_then_document_storage_receives_values() {
    // GIVEN
    let h = harness(store_with(sets_with(4)), MockAdapter::new(StorageProvider::JsonBin), MockHost::new());
    let document = Arc::new(MemoryDocument::default());
    let (client, _task) = start_plugin_channel(
        Arc::clone(&h.orchestrator),
        Arc::clone(&document) as Arc<dyn DocumentStorage>,
    );

    // WHEN
    let response = client
        .request(PluginRequest::Update(Box::new(UpdatePayload {
            tokens: Some(sets_with(10)),
            ..Default::default()
        })))
        .await
        .expect("channel answers");

    // THEN
    assert!(matches!(response, PluginResponse::Resolved(_)));
    assert!(document.value("values").is_some());

    let snapshot = client
        .request(PluginRequest::Snapshot)
        .await
        .expect("channel answers");
    let PluginResponse::Snapshot(state) = snapshot else {
        panic!("expected snapshot, got {snapshot:?}");
    };
    assert_eq!(state.tokens, sets_with(10));
}

#[tokio::test]
async fn given_all_clients_dropped_when_waiting_then_server_task_stops() {
    // GIVEN
    let h = harness(store_with(sets_with(4)), MockAdapter::new(StorageProvider::GitHub), MockHost::new());
    let (client, task) = start_plugin_channel(
        Arc::clone(&h.orchestrator),
        Arc::new(MemoryDocument::default()) as Arc<dyn DocumentStorage>,
    );

    // WHEN
    drop(client);

    // THEN
    tokio::time::timeout(std::time::Duration::from_secs(5), task)
        .await
        .expect("server stops")
        .expect("server task does not panic");
}
