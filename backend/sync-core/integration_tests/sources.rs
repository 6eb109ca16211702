//! Local edit propagation: auto-update of JSONBin and host document keys.

use crate::helpers::{MemoryDocument, MockAdapter, MockHost, context, harness, sets_with, store_with};

use sync_core::error::storage::REMOTE_NEWER_ERROR;
use sync_core::store::TokenStore;
use sync_core::sync::{SyncPhase, UpdatePayload, document_keys, load_document};

use models::{RemoteTokenData, StorageProvider, TokenSetStatus, TokenSets, UsedTokenSets};

use serde_json::json;

fn jsonbin_update(tokens: TokenSets, last_updated_at: &str) -> UpdatePayload {
    UpdatePayload {
        tokens: Some(tokens),
        updated_at: Some(String::from("2024-06-02T09:00:00Z")),
        should_update_remote: true,
        api: Some(context(StorageProvider::JsonBin)),
        last_updated_at: Some(last_updated_at.to_string()),
        ..Default::default()
    }
}

/// **VALUE**: A stale editor must not overwrite a newer bin.
///
/// **BUG THIS CATCHES**: Comparing timestamps as strings or in the wrong
/// direction, silently discarding someone else's push.
#[tokio::test]
async fn given_remote_newer_than_edit_base_when_updating_then_remote_is_not_overwritten() {
    // GIVEN
    let remote = RemoteTokenData::new(sets_with(2)).with_updated_at("2024-06-01T12:00:00Z");
    let adapter = MockAdapter::new(StorageProvider::JsonBin).with_remote(remote);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    let document = MemoryDocument::default();

    // WHEN
    let resolved = h
        .orchestrator
        .update_tokens_on_sources(jsonbin_update(sets_with(6), "2024-05-01T12:00:00Z"), &document)
        .await
        .expect("local update still succeeds");

    // THEN
    assert_eq!(h.adapter.save_count(), 0);
    assert_eq!(h.host.errors(), vec![REMOTE_NEWER_ERROR.to_string()]);
    assert_eq!(h.orchestrator.phase(), SyncPhase::PushError);
    assert_eq!(resolved["sizing.sm"].value, json!(12));
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(6));
}

#[tokio::test]
async fn given_edit_based_on_latest_remote_when_updating_then_bin_is_saved() {
    // GIVEN
    let remote = RemoteTokenData::new(sets_with(2)).with_updated_at("2024-06-01T12:00:00Z");
    let adapter = MockAdapter::new(StorageProvider::JsonBin).with_remote(remote);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    let document = MemoryDocument::default();

    // WHEN
    h.orchestrator
        .update_tokens_on_sources(jsonbin_update(sets_with(6), "2024-06-01T12:00:00Z"), &document)
        .await
        .expect("update should succeed");

    // THEN
    let save = h.adapter.last_save().expect("one save");
    assert_eq!(save.data.tokens, sets_with(6));
    assert_eq!(save.data.updated_at.as_deref(), Some("2024-06-02T09:00:00Z"));
    assert!(h.host.errors().is_empty());
}

#[tokio::test]
async fn given_local_or_prohibited_edit_when_updating_then_remote_is_never_contacted() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::JsonBin);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    let document = MemoryDocument::default();
    let local = UpdatePayload {
        is_local: true,
        ..jsonbin_update(sets_with(6), "2024-06-01T12:00:00Z")
    };
    let prohibited = UpdatePayload {
        edit_prohibited: true,
        ..jsonbin_update(sets_with(8), "2024-06-01T12:00:00Z")
    };

    // WHEN
    h.orchestrator
        .update_tokens_on_sources(local, &document)
        .await
        .expect("update should succeed");
    h.orchestrator
        .update_tokens_on_sources(prohibited, &document)
        .await
        .expect("update should succeed");

    // THEN
    assert_eq!(h.adapter.save_count(), 0);
    assert!(h.factory.contexts.lock().expect("contexts lock").is_empty());
    assert!(h.orchestrator.store().snapshot().await.edit_prohibited);
}

#[tokio::test]
async fn given_update_when_applied_then_every_document_key_is_written() {
    // GIVEN
    let h = harness(TokenStore::new(), MockAdapter::new(StorageProvider::JsonBin), MockHost::new());
    let document = MemoryDocument::default();
    let mut used = UsedTokenSets::new();
    used.insert(String::from("global"), TokenSetStatus::Enabled);
    let payload = UpdatePayload {
        tokens: Some(sets_with(4)),
        used_token_set: used.clone(),
        active_theme: Some(String::from("light")),
        check_for_changes: true,
        ..Default::default()
    };

    // WHEN
    h.orchestrator
        .update_tokens_on_sources(payload, &document)
        .await
        .expect("update should succeed");

    // THEN
    for key in document_keys::ALL {
        assert!(document.value(key).is_some(), "key {key} not written");
    }
    let reloaded = load_document(&document).await.expect("document loads");
    assert_eq!(reloaded.values, sets_with(4));
    assert_eq!(reloaded.used_token_sets, used);
    assert_eq!(reloaded.active_theme.as_deref(), Some("light"));
    assert!(reloaded.check_for_changes);
}

/// **BUG THIS CATCHES**: One oversized key aborting the whole save and
/// losing themes and selection along with it.
#[tokio::test]
async fn given_values_key_rejected_when_updating_then_other_keys_still_persist() {
    // GIVEN
    let h = harness(TokenStore::new(), MockAdapter::new(StorageProvider::JsonBin), MockHost::new());
    let document = MemoryDocument::rejecting(&[document_keys::VALUES]);
    let payload = UpdatePayload {
        tokens: Some(sets_with(4)),
        active_theme: Some(String::from("dark")),
        ..Default::default()
    };

    // WHEN
    let resolved = h
        .orchestrator
        .update_tokens_on_sources(payload, &document)
        .await
        .expect("update should succeed");

    // THEN
    assert!(document.value(document_keys::VALUES).is_none());
    assert_eq!(
        document.value(document_keys::ACTIVE_THEME).as_deref(),
        Some("\"dark\"")
    );
    assert_eq!(resolved.len(), 2);
}

#[tokio::test]
async fn given_selection_only_update_when_applied_then_tokens_are_kept() {
    // GIVEN
    let h = harness(store_with(sets_with(4)), MockAdapter::new(StorageProvider::JsonBin), MockHost::new());
    let document = MemoryDocument::default();
    let mut used = UsedTokenSets::new();
    used.insert(String::from("global"), TokenSetStatus::Disabled);

    // WHEN
    let resolved = h
        .orchestrator
        .update_tokens_on_sources(
            UpdatePayload {
                used_token_set: used,
                ..Default::default()
            },
            &document,
        )
        .await
        .expect("update should succeed");

    // THEN
    assert!(resolved.is_empty());
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(4));
}

#[tokio::test]
async fn given_stored_values_with_repeated_name_when_loading_then_later_token_wins() {
    // GIVEN
    let document = MemoryDocument::default();
    document
        .keys
        .lock()
        .expect("keys lock")
        .insert(
            document_keys::VALUES.to_string(),
            json!({
                "global": [
                    {"name": "sizing.xs", "type": "sizing", "value": 4},
                    {"name": "sizing.sm", "type": "sizing", "value": 8},
                    {"name": "sizing.xs", "type": "sizing", "value": 6}
                ]
            })
            .to_string(),
        );

    // WHEN
    let loaded = load_document(&document).await.expect("document loads");

    // THEN
    let global = &loaded.values["global"];
    assert_eq!(global.names().collect::<Vec<_>>(), vec!["sizing.xs", "sizing.sm"]);
    assert_eq!(global.get("sizing.xs").map(|t| &t.value), Some(&json!(6)));
}
