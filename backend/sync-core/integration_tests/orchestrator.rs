//! Pull, push, restore and add-provider flows against an in-memory remote.

use crate::helpers::{MockAdapter, MockHost, context, harness, sets_with, store_with};

use sync_core::error::storage::{GENERAL_CONNECTION_ERROR, ID_NON_EXIST_ERROR};
use sync_core::error::sync::EMPTY_BRANCH_ERROR;
use sync_core::storage::files::{decode_document, encode_document};
use sync_core::store::{TokenStore, serialize_token_values};
use sync_core::sync::{PullOutcome, PushOutcome, RestoreOutcome, SyncPhase};

use models::{
    RemoteTokenData, StorageProvider, SyncResult, Token, TokenSet, TokenSets, TokenType,
};

use std::sync::atomic::Ordering;

use serde_json::json;

// ============================================
// PUSH
// ============================================

/// **VALUE**: A git remote without branches must never be written to.
///
/// **BUG THIS CATCHES**: Saving to a guessed default branch when the
/// repository is empty or the token cannot list branches.
#[tokio::test]
async fn given_git_remote_without_branches_when_pushing_then_reports_empty_branch_and_saves_nothing()
 {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitHub).with_branches(Some(Vec::new()));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let result = h.orchestrator.push(&context(StorageProvider::GitHub)).await;

    // THEN
    let error = result.expect_err("push should fail");
    assert_eq!(error.error_message(), EMPTY_BRANCH_ERROR);
    assert_eq!(h.adapter.save_count(), 0);
    assert_eq!(h.host.errors(), vec![EMPTY_BRANCH_ERROR.to_string()]);
    assert_eq!(h.host.dialogs.load(Ordering::SeqCst), 0);
    assert_eq!(h.orchestrator.phase(), SyncPhase::PushError);
}

#[tokio::test]
async fn given_branch_listing_unavailable_when_pushing_then_reports_empty_branch() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitLab).with_branches(None);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let result = h.orchestrator.push(&context(StorageProvider::GitLab)).await;

    // THEN
    assert_eq!(
        result.expect_err("push should fail").error_message(),
        EMPTY_BRANCH_ERROR
    );
    assert_eq!(h.adapter.save_count(), 0);
}

#[tokio::test]
async fn given_remote_identical_to_local_when_pushing_then_nothing_to_commit() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::GitHub).with_remote(RemoteTokenData::new(sets_with(4)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h
        .orchestrator
        .push(&context(StorageProvider::GitHub))
        .await
        .expect("push should succeed");

    // THEN
    assert_eq!(outcome, PushOutcome::NothingToCommit);
    assert_eq!(h.adapter.save_count(), 0);
    assert_eq!(h.host.dialogs.load(Ordering::SeqCst), 0);
    assert_eq!(h.host.infos(), vec![String::from("Nothing to commit")]);
    assert_eq!(h.orchestrator.phase(), SyncPhase::PushedNothing);
    assert!(!h.orchestrator.store().snapshot().await.has_unsynced_changes());
}

/// **VALUE**: A remote that only differs in token order is not a change.
///
/// **BUG THIS CATCHES**: Re-committing every push once the nested file
/// layout has regrouped interleaved tokens.
#[tokio::test]
async fn given_remote_with_regrouped_tokens_when_pushing_then_nothing_to_commit() {
    // GIVEN
    let mut local = TokenSets::new();
    local.insert(
        String::from("global"),
        TokenSet::from(vec![
            Token::new("sizing.xs", TokenType::Sizing, json!(4)),
            Token::new("color.red", TokenType::Color, json!("#ff0000")),
            Token::new("sizing.sm", TokenType::Sizing, json!("$sizing.xs * 2")),
        ]),
    );
    let remote = decode_document(&encode_document(&RemoteTokenData::new(local.clone())))
        .expect("decoded");
    let adapter = MockAdapter::new(StorageProvider::GitHub).with_remote(remote);
    let h = harness(store_with(local), adapter, MockHost::new());

    // WHEN
    let outcome = h
        .orchestrator
        .push(&context(StorageProvider::GitHub))
        .await
        .expect("push should succeed");

    // THEN
    assert_eq!(outcome, PushOutcome::NothingToCommit);
    assert_eq!(h.adapter.save_count(), 0);
    assert_eq!(h.host.dialogs.load(Ordering::SeqCst), 0);
}

/// **VALUE**: The full push path: dialog, branch creation, save, PR link.
#[tokio::test]
async fn given_dialog_names_new_branch_when_pushing_then_branch_is_cut_from_configured_branch() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitHub)
        .with_branches(Some(vec![String::from("develop"), String::from("main")]))
        .with_remote(RemoteTokenData::new(sets_with(2)));
    let host = MockHost::new().pushing_to("feature/colors");
    let h = harness(store_with(sets_with(4)), adapter, host);

    // WHEN
    let outcome = h
        .orchestrator
        .push(&context(StorageProvider::GitHub))
        .await
        .expect("push should succeed");

    // THEN
    assert_eq!(
        outcome,
        PushOutcome::Pushed {
            branch: String::from("feature/colors"),
            pull_request_url: Some(String::from(
                "https://example.com/acme/tokens/compare/feature/colors"
            )),
        }
    );
    assert_eq!(
        *h.adapter.created_branches.lock().expect("branches lock"),
        vec![(String::from("feature/colors"), String::from("main"))]
    );

    let save = h.adapter.last_save().expect("one save");
    assert_eq!(save.branch, "feature/colors");
    assert_eq!(save.message, "Update from tests");
    assert_eq!(save.data.tokens, sets_with(4));
    assert_eq!(save.data.metadata.token_set_order, vec![String::from("global")]);

    let state = h.orchestrator.store().snapshot().await;
    assert!(!state.has_unsynced_changes());
    assert_eq!(
        state.api.as_ref().and_then(|api| api.branch.as_deref()),
        Some("feature/colors")
    );
    assert_eq!(h.orchestrator.phase(), SyncPhase::PushedSuccess);
    assert_eq!(h.host.successes.lock().expect("successes lock").len(), 1);
}

#[tokio::test]
async fn given_configured_branch_missing_when_creating_branch_then_first_listed_is_base() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitLab)
        .with_branches(Some(vec![String::from("trunk")]));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new().pushing_to("tokens"));

    // WHEN
    h.orchestrator
        .push(&context(StorageProvider::GitLab))
        .await
        .expect("push should succeed");

    // THEN
    assert_eq!(
        *h.adapter.created_branches.lock().expect("branches lock"),
        vec![(String::from("tokens"), String::from("trunk"))]
    );
}

#[tokio::test]
async fn given_dialog_dismissed_when_pushing_then_cancelled_without_write() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::Bitbucket);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new().cancelling());

    // WHEN
    let outcome = h
        .orchestrator
        .push(&context(StorageProvider::Bitbucket))
        .await
        .expect("cancel is not an error");

    // THEN
    assert_eq!(outcome, PushOutcome::Cancelled);
    assert_eq!(h.adapter.save_count(), 0);
    assert_eq!(h.orchestrator.phase(), SyncPhase::Idle);
    assert!(h.orchestrator.store().snapshot().await.has_unsynced_changes());
}

/// **BUG THIS CATCHES**: A failed save leaving the push dialog open and
/// the local state marked as synced.
#[tokio::test]
async fn given_save_fails_when_pushing_then_dialog_closes_and_state_stays_unsynced() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitHub).failing_save(500);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let result = h.orchestrator.push(&context(StorageProvider::GitHub)).await;

    // THEN
    assert_eq!(
        result.expect_err("save fails").error_message(),
        GENERAL_CONNECTION_ERROR
    );
    assert_eq!(h.host.closed_dialogs.load(Ordering::SeqCst), 1);
    assert_eq!(h.host.errors(), vec![GENERAL_CONNECTION_ERROR.to_string()]);
    assert!(h.orchestrator.store().snapshot().await.has_unsynced_changes());
    assert_eq!(h.orchestrator.phase(), SyncPhase::PushError);
}

#[tokio::test]
async fn given_branch_creation_refused_when_pushing_then_dialog_closes_and_nothing_saved() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::Ado).refusing_branches();
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new().pushing_to("new"));

    // WHEN
    let result = h.orchestrator.push(&context(StorageProvider::Ado)).await;

    // THEN
    assert!(result.is_err());
    assert_eq!(h.adapter.save_count(), 0);
    assert_eq!(h.host.closed_dialogs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_jsonbin_when_pushing_then_saves_without_dialog() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::JsonBin);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h
        .orchestrator
        .push(&context(StorageProvider::JsonBin))
        .await
        .expect("push should succeed");

    // THEN
    assert_eq!(
        outcome,
        PushOutcome::Pushed {
            branch: String::from("main"),
            pull_request_url: None,
        }
    );
    assert_eq!(h.host.dialogs.load(Ordering::SeqCst), 0);
    assert_eq!(
        h.adapter.last_save().expect("one save").message,
        "Update tokens"
    );
}

// ============================================
// PULL
// ============================================

#[tokio::test]
async fn given_empty_local_state_when_pulling_then_remote_applies_without_confirmation() {
    // GIVEN
    let remote = RemoteTokenData::new(sets_with(6)).with_updated_at("2024-05-01T10:00:00Z");
    let adapter = MockAdapter::new(StorageProvider::GitHub).with_remote(remote);
    let h = harness(TokenStore::new(), adapter, MockHost::new());

    // WHEN
    let outcome = h
        .orchestrator
        .pull(&context(StorageProvider::GitHub))
        .await
        .expect("pull should succeed");

    // THEN
    assert_eq!(outcome, PullOutcome::Applied);
    assert_eq!(h.host.confirmations.load(Ordering::SeqCst), 0);

    let state = h.orchestrator.store().snapshot().await;
    assert_eq!(state.tokens, sets_with(6));
    assert_eq!(state.updated_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    assert_eq!(state.last_synced_state, serialize_token_values(&sets_with(6)));
    assert_eq!(state.api.as_ref().map(|api| api.provider), Some(StorageProvider::GitHub));
    assert_eq!(state.resolve()["sizing.sm"].value, json!(12));
    assert_eq!(h.orchestrator.phase(), SyncPhase::Applied);
}

#[tokio::test]
async fn given_differing_remote_and_confirmation_when_pulling_then_remote_replaces_local() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::GitLab).with_remote(RemoteTokenData::new(sets_with(8)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h
        .orchestrator
        .pull(&context(StorageProvider::GitLab))
        .await
        .expect("pull should succeed");

    // THEN
    assert_eq!(outcome, PullOutcome::Applied);
    assert_eq!(h.host.confirmations.load(Ordering::SeqCst), 1);
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(8));
}

/// **VALUE**: Declining a pull on a writable remote pushes local tokens so
/// both sides agree again.
#[tokio::test]
async fn given_user_declines_when_pulling_from_git_then_local_is_kept_and_pushed() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::GitHub).with_remote(RemoteTokenData::new(sets_with(8)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new().declining());

    // WHEN
    let outcome = h
        .orchestrator
        .pull(&context(StorageProvider::GitHub))
        .await
        .expect("pull should succeed");

    // THEN
    assert_eq!(
        outcome,
        PullOutcome::Declined {
            push: Some(PushOutcome::Pushed {
                branch: String::from("main"),
                pull_request_url: Some(String::from(
                    "https://example.com/acme/tokens/compare/main"
                )),
            }),
        }
    );
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(4));
    assert_eq!(
        h.adapter.last_save().expect("one save").data.tokens,
        sets_with(4)
    );
}

#[tokio::test]
async fn given_user_declines_when_pulling_from_url_then_nothing_is_written() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::Url).with_remote(RemoteTokenData::new(sets_with(8)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new().declining());

    // WHEN
    let outcome = h
        .orchestrator
        .pull(&context(StorageProvider::Url))
        .await
        .expect("pull should succeed");

    // THEN
    assert_eq!(outcome, PullOutcome::Declined { push: None });
    assert_eq!(h.adapter.save_count(), 0);
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(4));
}

#[tokio::test]
async fn given_identical_remote_when_pulling_then_nothing_to_commit_and_marked_synced() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::JsonBin).with_remote(RemoteTokenData::new(sets_with(4)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h
        .orchestrator
        .pull(&context(StorageProvider::JsonBin))
        .await
        .expect("pull should succeed");

    // THEN
    assert_eq!(outcome, PullOutcome::NothingToCommit);
    assert_eq!(h.host.confirmations.load(Ordering::SeqCst), 0);
    assert_eq!(h.host.infos(), vec![String::from("Nothing to commit")]);
    assert!(!h.orchestrator.store().snapshot().await.has_unsynced_changes());
    assert_eq!(h.orchestrator.phase(), SyncPhase::NoChange);
}

/// **BUG THIS CATCHES**: A rejected token wiping or half-replacing local
/// tokens.
#[tokio::test]
async fn given_rejected_credentials_when_pulling_then_error_reported_once_and_local_untouched() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitHub).failing_retrieve(401);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let result = h.orchestrator.pull(&context(StorageProvider::GitHub)).await;

    // THEN
    assert_eq!(
        result.expect_err("pull should fail").error_message(),
        "GITHUB_CREDENTIAL_ERROR"
    );
    assert_eq!(h.host.errors(), vec![String::from("GITHUB_CREDENTIAL_ERROR")]);
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(4));
}

#[tokio::test]
async fn given_empty_remote_when_pulling_then_remote_empty_and_local_untouched() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::Bitbucket);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h
        .orchestrator
        .pull(&context(StorageProvider::Bitbucket))
        .await
        .expect("pull should succeed");

    // THEN
    assert_eq!(outcome, PullOutcome::RemoteEmpty);
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(4));
}

#[tokio::test]
async fn given_failing_remote_when_retrieving_then_failure_carries_code() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitLab).failing_retrieve(403);
    let h = harness(TokenStore::new(), adapter, MockHost::new());

    // WHEN
    let result = h.orchestrator.retrieve(&context(StorageProvider::GitLab)).await;

    // THEN
    assert_eq!(
        result,
        SyncResult::failure("GITLAB_CREDENTIAL_ERROR")
    );
    assert!(h.host.errors().is_empty());
}

#[tokio::test]
async fn given_phase_subscriber_when_pull_applies_then_sees_final_phase() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::GitHub).with_remote(RemoteTokenData::new(sets_with(6)));
    let h = harness(TokenStore::new(), adapter, MockHost::new());
    let mut phases = h.orchestrator.subscribe();

    // WHEN
    h.orchestrator
        .pull(&context(StorageProvider::GitHub))
        .await
        .expect("pull should succeed");

    // THEN
    assert!(phases.has_changed().expect("sender alive"));
    assert_eq!(*phases.borrow_and_update(), SyncPhase::Applied);
}

// ============================================
// RESTORE
// ============================================

#[tokio::test]
async fn given_empty_remote_and_local_tokens_when_restoring_then_remote_is_seeded() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::JsonBin);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h.orchestrator.restore(&context(StorageProvider::JsonBin)).await;

    // THEN
    assert_eq!(
        outcome,
        RestoreOutcome::Seeded(PushOutcome::Pushed {
            branch: String::from("main"),
            pull_request_url: None,
        })
    );
    assert_eq!(h.adapter.save_count(), 1);
}

#[tokio::test]
async fn given_empty_remote_and_no_local_tokens_when_restoring_then_nothing_is_written() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::JsonBin);
    let h = harness(TokenStore::new(), adapter, MockHost::new());

    // WHEN
    let outcome = h.orchestrator.restore(&context(StorageProvider::JsonBin)).await;

    // THEN
    assert_eq!(outcome, RestoreOutcome::Pulled(PullOutcome::RemoteEmpty));
    assert_eq!(h.adapter.save_count(), 0);
}

#[tokio::test]
async fn given_unreachable_remote_when_restoring_then_local_state_survives() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::Ado).failing_retrieve(503);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h.orchestrator.restore(&context(StorageProvider::Ado)).await;

    // THEN
    assert_eq!(
        outcome,
        RestoreOutcome::Unreachable {
            error_message: GENERAL_CONNECTION_ERROR.to_string(),
        }
    );
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(4));
}

// ============================================
// ADD PROVIDER
// ============================================

#[tokio::test]
async fn given_jsonbin_without_secret_when_adding_then_missing_credentials() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::JsonBin);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    let ctx = models::SyncContext::new(StorageProvider::JsonBin, "bin-1");

    // WHEN
    let result = h.orchestrator.add_provider(ctx).await;

    // THEN
    assert_eq!(
        result.expect_err("no secret").error_message(),
        ID_NON_EXIST_ERROR
    );
    assert!(h.factory.contexts.lock().expect("contexts lock").is_empty());
}

/// **VALUE**: Adding a JSONBin without an id creates the bin, seeds it and
/// stores the new id as the active remote.
#[tokio::test]
async fn given_jsonbin_without_id_when_adding_then_bin_is_created_and_seeded() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::JsonBin).creating("bin-123");
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    let ctx = models::SyncContext::new(StorageProvider::JsonBin, "")
        .with_name("Design tokens")
        .with_secret("master-key");

    // WHEN
    let added = h
        .orchestrator
        .add_provider(ctx)
        .await
        .expect("add should succeed");

    // THEN
    assert_eq!(added.id, "bin-123");
    assert_eq!(h.adapter.save_count(), 1);
    let state = h.orchestrator.store().snapshot().await;
    assert_eq!(state.api.as_ref().map(|api| api.id.as_str()), Some("bin-123"));
}

#[tokio::test]
async fn given_url_without_tokens_when_adding_then_credential_error_for_url() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::Url);
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let result = h.orchestrator.add_provider(context(StorageProvider::Url)).await;

    // THEN
    assert_eq!(
        result.expect_err("no tokens").error_message(),
        "URL_CREDENTIAL_ERROR"
    );
    assert!(h.orchestrator.store().snapshot().await.api.is_none());
}

#[tokio::test]
async fn given_local_provider_when_adding_then_active_remote_is_cleared() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::GitHub).with_remote(RemoteTokenData::new(sets_with(4)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());
    h.orchestrator
        .pull(&context(StorageProvider::GitHub))
        .await
        .expect("pull should succeed");

    // WHEN
    h.orchestrator
        .add_provider(models::SyncContext::local())
        .await
        .expect("local always succeeds");

    // THEN
    assert!(h.orchestrator.store().snapshot().await.api.is_none());
}

#[tokio::test]
async fn given_git_provider_with_tokens_when_adding_then_remote_is_pulled_and_active() {
    // GIVEN
    let adapter =
        MockAdapter::new(StorageProvider::GitHub).with_remote(RemoteTokenData::new(sets_with(6)));
    let h = harness(TokenStore::new(), adapter, MockHost::new());

    // WHEN
    h.orchestrator
        .add_provider(context(StorageProvider::GitHub).with_internal_id("gh-1"))
        .await
        .expect("add should succeed");

    // THEN
    let state = h.orchestrator.store().snapshot().await;
    assert_eq!(state.tokens, sets_with(6));
    assert_eq!(
        state.api.as_ref().and_then(|api| api.internal_id.as_deref()),
        Some("gh-1")
    );
}

/// **VALUE**: An empty repository is rejected before anything is stored.
///
/// **WHY THIS MATTERS**: With no local tokens there is nothing to seed, so
/// without the branch check the entry would be saved as the active remote
/// and the first push would fail later.
///
/// **BUG THIS CATCHES**: Skipping the branch listing on add and restore.
#[tokio::test]
async fn given_git_repository_without_branches_when_adding_then_empty_branch_and_not_active() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitHub).with_branches(Some(Vec::new()));
    let h = harness(TokenStore::new(), adapter, MockHost::new());

    // WHEN
    let result = h.orchestrator.add_provider(context(StorageProvider::GitHub)).await;

    // THEN
    assert_eq!(
        result.expect_err("no branches").error_message(),
        EMPTY_BRANCH_ERROR
    );
    assert_eq!(h.host.errors(), vec![EMPTY_BRANCH_ERROR.to_string()]);
    assert!(h.orchestrator.store().snapshot().await.api.is_none());
    assert_eq!(h.adapter.save_count(), 0);
}

#[tokio::test]
async fn given_branch_listing_unavailable_when_restoring_then_local_state_survives() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::Bitbucket)
        .with_branches(None)
        .with_remote(RemoteTokenData::new(sets_with(6)));
    let h = harness(store_with(sets_with(4)), adapter, MockHost::new());

    // WHEN
    let outcome = h.orchestrator.restore(&context(StorageProvider::Bitbucket)).await;

    // THEN
    assert_eq!(
        outcome,
        RestoreOutcome::Unreachable {
            error_message: EMPTY_BRANCH_ERROR.to_string(),
        }
    );
    assert_eq!(h.orchestrator.store().snapshot().await.tokens, sets_with(4));
}

/// **VALUE**: Read-only credentials lock local editing once the remote is
/// connected.
///
/// **BUG THIS CATCHES**: Letting users edit tokens they can never push.
#[tokio::test]
async fn given_read_only_repository_when_adding_then_edits_are_prohibited() {
    // GIVEN
    let adapter = MockAdapter::new(StorageProvider::GitLab)
        .with_remote(RemoteTokenData::new(sets_with(6)))
        .read_only();
    let h = harness(TokenStore::new(), adapter, MockHost::new());

    // WHEN
    h.orchestrator
        .add_provider(context(StorageProvider::GitLab))
        .await
        .expect("add should succeed");

    // THEN
    let state = h.orchestrator.store().snapshot().await;
    assert!(state.edit_prohibited);
    assert_eq!(state.tokens, sets_with(6));
    let edit = h
        .orchestrator
        .store()
        .create_token(
            "global",
            Token::new("sizing.md", TokenType::Sizing, json!(12)),
        )
        .await;
    assert!(edit.is_err());
}

#[tokio::test]
async fn given_writable_repository_when_restoring_then_earlier_lock_is_lifted() {
    // GIVEN
    let store = store_with(sets_with(4));
    store.set_edit_prohibited(true).await.expect("lock applies");
    let adapter =
        MockAdapter::new(StorageProvider::GitHub).with_remote(RemoteTokenData::new(sets_with(4)));
    let h = harness(store, adapter, MockHost::new());

    // WHEN
    let outcome = h.orchestrator.restore(&context(StorageProvider::GitHub)).await;

    // THEN
    assert_eq!(outcome, RestoreOutcome::Pulled(PullOutcome::NothingToCommit));
    assert!(!h.orchestrator.store().snapshot().await.edit_prohibited);
}
