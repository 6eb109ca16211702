use crate::error::edit::EditError;
use crate::storage::files::{decode_document, encode_document};
use crate::store::{TokenData, TokenState, TokenStore, serialize_token_values};

use models::{
    RemoteTokenData, StorageProvider, SyncContext, ThemeObject, Token, TokenDocument, TokenSet, TokenSetStatus,
    TokenSets, TokenType,
};

use std::sync::Arc;

use serde_json::json;

fn document_sets() -> TokenSets {
    let mut sets = TokenSets::new();
    sets.insert(
        String::from("global"),
        TokenSet::from(vec![Token::new("sizing.xs", TokenType::Sizing, json!(4))]),
    );
    sets.insert(
        String::from("dark"),
        TokenSet::from(vec![Token::new("sizing.xs", TokenType::Sizing, json!(6))]),
    );
    sets
}

/// **VALUE**: Verifies a snapshot taken before an edit never changes.
///
/// **WHY THIS MATTERS**: Resolution passes read a snapshot while edits and
/// pulls run; they must see either the old or the new state, never a mix.
///
/// **BUG THIS CATCHES**: Mutating the published state in place.
#[tokio::test]
async fn given_snapshot_when_store_is_edited_then_snapshot_is_unchanged() {
    // GIVEN
    let store = TokenStore::new();
    let before = store.snapshot().await;

    // WHEN
    store
        .create_token("global", Token::new("sizing.sm", TokenType::Sizing, json!("$sizing.xs * 2")))
        .await
        .expect("token created");

    // THEN
    assert!(before.tokens.is_empty());
    let after = store.snapshot().await;
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.tokens["global"].len(), 1);
    assert_eq!(
        after.used_token_sets.get("global"),
        Some(&TokenSetStatus::Enabled)
    );
    assert!(after.updated_at.is_some());
}

#[tokio::test]
async fn given_create_then_resolve_when_aliasing_then_scenario_value_is_eight() {
    // GIVEN
    let store = TokenStore::new();
    store
        .create_token("global", Token::new("sizing.xs", TokenType::Sizing, json!(4)))
        .await
        .expect("created xs");

    // WHEN
    store
        .create_token("global", Token::new("sizing.sm", TokenType::Sizing, json!("$sizing.xs * 2")))
        .await
        .expect("created sm");

    // THEN
    let resolved = store.snapshot().await.resolve();
    assert_eq!(resolved["sizing.sm"].value, json!(8));
}

#[tokio::test]
async fn given_failed_edit_when_applied_then_published_state_is_kept() {
    // GIVEN
    let store = TokenStore::new();
    store
        .create_token("global", Token::new("a", TokenType::Sizing, json!(1)))
        .await
        .expect("created");
    let before = store.snapshot().await;

    // WHEN
    let result = store.delete_token("global", "does.not.exist").await;

    // THEN
    assert!(matches!(result, Err(EditError::TokenNotFound { .. })));
    assert!(Arc::ptr_eq(&before, &store.snapshot().await));
}

#[tokio::test]
async fn given_edit_prohibited_when_editing_tokens_then_prohibited_error() {
    // GIVEN
    let store = TokenStore::new();
    store.set_edit_prohibited(true).await.expect("flag set");

    // WHEN
    let result = store
        .create_token("global", Token::new("a", TokenType::Sizing, json!(1)))
        .await;

    // THEN
    assert!(matches!(result, Err(EditError::Prohibited { .. })));
    assert!(store.snapshot().await.tokens.is_empty());
}

#[tokio::test]
async fn given_cloned_handles_when_both_edit_then_they_share_state() {
    let store = TokenStore::new();
    let other = store.clone();

    store
        .create_token("global", Token::new("a", TokenType::Sizing, json!(1)))
        .await
        .expect("created via first");
    other
        .create_token("global", Token::new("b", TokenType::Sizing, json!(2)))
        .await
        .expect("created via second");

    let names: Vec<String> = store.snapshot().await.tokens["global"]
        .names()
        .map(str::to_string)
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn given_token_data_without_selection_when_set_then_vanished_sets_drop_and_new_enable() {
    // GIVEN: A selection naming a set the new data no longer has
    let store = TokenStore::new();
    let mut selection = models::UsedTokenSets::new();
    selection.insert(String::from("old"), TokenSetStatus::Enabled);
    selection.insert(String::from("dark"), TokenSetStatus::Disabled);
    store.set_used_token_sets(selection).await.expect("selection set");

    // WHEN
    store
        .set_token_data(TokenData {
            tokens: document_sets(),
            ..Default::default()
        })
        .await
        .expect("data set");

    // THEN
    let state = store.snapshot().await;
    assert_eq!(state.used_token_sets.get("old"), None);
    assert_eq!(state.used_token_sets.get("dark"), Some(&TokenSetStatus::Disabled));
    assert_eq!(state.used_token_sets.get("global"), Some(&TokenSetStatus::Enabled));
}

#[tokio::test]
async fn given_last_synced_state_when_tokens_change_then_unsynced_changes_are_reported() {
    // GIVEN
    let store = TokenStore::with_state(TokenState::from_document(TokenDocument::new(
        document_sets(),
    )));
    let serialized = store.snapshot().await.serialized_tokens();
    store
        .set_last_synced_state(serialized)
        .await
        .expect("synced state set");
    assert!(!store.snapshot().await.has_unsynced_changes());

    // WHEN
    store
        .edit_token("global", Token::new("sizing.xs", TokenType::Sizing, json!(5)), None)
        .await
        .expect("edited");

    // THEN
    assert!(store.snapshot().await.has_unsynced_changes());
}

#[test]
fn given_active_theme_when_resolving_then_theme_selection_wins() {
    // GIVEN
    let mut state = TokenState::from_document(TokenDocument::new(document_sets()));
    state.themes = vec![
        ThemeObject::new("t-dark", "Dark")
            .with_set("global", TokenSetStatus::Source)
            .with_set("dark", TokenSetStatus::Enabled),
    ];
    state
        .used_token_sets
        .insert(String::from("global"), TokenSetStatus::Enabled);

    // WHEN
    let without_theme = state.resolve();
    state.active_theme = Some(String::from("Dark"));
    let with_theme = state.resolve();
    let by_request = state.resolve_with_theme(Some("t-dark"));

    // THEN
    assert_eq!(without_theme["sizing.xs"].value, json!(4));
    assert_eq!(with_theme["sizing.xs"].value, json!(6));
    assert_eq!(by_request, with_theme);
}

#[test]
fn given_state_with_api_when_converted_to_document_then_secret_is_not_kept() {
    // GIVEN
    let mut state = TokenState::from_document(TokenDocument::new(document_sets()));
    state.api = Some(
        SyncContext::new(StorageProvider::GitHub, "acme/tokens")
            .with_branch("main")
            .with_secret("ghp_secret"),
    );

    // WHEN
    let document = state.to_document();
    let json = serde_json::to_string(&document).expect("serialise");

    // THEN
    let storage = document.storage_type.expect("storage type kept");
    assert_eq!(storage.provider, StorageProvider::GitHub);
    assert_eq!(storage.branch.as_deref(), Some("main"));
    assert!(!json.contains("ghp_secret"));
}

/// **VALUE**: Verifies the diff text ignores token order inside a set.
///
/// **WHY THIS MATTERS**: The nested remote layout groups tokens by path, so
/// interleaved groups come back reordered. Comparing in authored order would
/// re-commit unchanged tokens on every push and prompt on every pull.
///
/// **BUG THIS CATCHES**: Serialising sets in insertion order.
#[test]
fn given_interleaved_groups_when_round_tripped_through_file_then_serialization_is_equal() {
    // GIVEN: Groups interleaved the way create_token produces them
    let mut sets = TokenSets::new();
    sets.insert(
        String::from("global"),
        TokenSet::from(vec![
            Token::new("sizing.xs", TokenType::Sizing, json!(4)),
            Token::new("color.red", TokenType::Color, json!("#ff0000")),
            Token::new("sizing.sm", TokenType::Sizing, json!("$sizing.xs * 2")),
        ]),
    );

    // WHEN
    let decoded = decode_document(&encode_document(&RemoteTokenData::new(sets.clone())))
        .expect("decoded");

    // THEN: Order differs, serialization does not
    let names: Vec<&str> = decoded.tokens["global"].iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["sizing.xs", "sizing.sm", "color.red"]);
    assert_eq!(serialize_token_values(&decoded.tokens), serialize_token_values(&sets));
}

#[test]
fn given_changed_value_when_serializing_then_text_differs() {
    let mut changed = document_sets();
    changed.insert(
        String::from("global"),
        TokenSet::from(vec![Token::new("sizing.xs", TokenType::Sizing, json!(8))]),
    );

    assert_ne!(serialize_token_values(&changed), serialize_token_values(&document_sets()));
}
