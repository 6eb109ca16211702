// Unit tests for the terminal host

use crate::host::{PromptOptions, TerminalHost};

use sync_core::sync::{PushSettings, SyncHost};

use models::{StorageProvider, SyncContext};

fn host(input: &'static [u8], options: PromptOptions) -> TerminalHost {
    TerminalHost::new(input, tokio::io::sink(), options)
}

fn options() -> PromptOptions {
    PromptOptions {
        default_commit_message: String::from("Update tokens"),
        ..PromptOptions::default()
    }
}

fn github() -> SyncContext {
    SyncContext::new(StorageProvider::GitHub, "acme/tokens").with_branch("develop")
}

#[tokio::test]
async fn given_yes_answer_when_confirming_pull_then_true() {
    let host = host(b"YES\n", options());

    assert!(host.confirm_pull(StorageProvider::GitHub).await);
}

/// **VALUE**: Verifies anything but an explicit yes keeps local tokens.
///
/// **WHY THIS MATTERS**: A pull overwrites local edits. Pressing enter or
/// closing stdin must never count as consent.
///
/// **BUG THIS CATCHES**: Would catch a default-yes prompt or EOF treated as
/// confirmation.
#[tokio::test]
async fn given_empty_or_closed_input_when_confirming_pull_then_false() {
    // GIVEN: An empty answer, then a closed input
    let enter = host(b"\n", options());
    let closed = host(b"", options());

    // WHEN / THEN
    assert!(!enter.confirm_pull(StorageProvider::GitLab).await);
    assert!(!closed.confirm_pull(StorageProvider::GitLab).await);
}

#[tokio::test]
async fn given_assume_yes_when_confirming_pull_then_no_input_is_read() {
    let host = host(
        b"",
        PromptOptions {
            assume_yes: true,
            ..options()
        },
    );

    assert!(host.confirm_pull(StorageProvider::Url).await);
}

#[tokio::test]
async fn given_answers_when_push_dialog_then_they_are_used() {
    // GIVEN
    let host = host(b"feature/colors\nAdd brand colors\n", options());

    // WHEN
    let settings = host
        .push_dialog(&github(), &[String::from("main"), String::from("develop")])
        .await;

    // THEN
    assert_eq!(
        settings,
        Some(PushSettings {
            branch: String::from("feature/colors"),
            commit_message: String::from("Add brand colors"),
        })
    );
}

#[tokio::test]
async fn given_empty_answers_when_push_dialog_then_defaults_are_used() {
    let host = host(b"\n\n", options());

    let settings = host.push_dialog(&github(), &[]).await;

    assert_eq!(
        settings,
        Some(PushSettings {
            branch: String::from("develop"),
            commit_message: String::from("Update tokens"),
        })
    );
}

#[tokio::test]
async fn given_presets_when_push_dialog_then_no_input_is_read() {
    let host = host(
        b"",
        PromptOptions {
            branch: Some(String::from("release")),
            commit_message: Some(String::from("Release tokens")),
            ..options()
        },
    );

    let settings = host.push_dialog(&github(), &[]).await;

    assert_eq!(
        settings.map(|s| (s.branch, s.commit_message)),
        Some((String::from("release"), String::from("Release tokens")))
    );
}

/// **VALUE**: Verifies a closed input cancels the push dialog.
///
/// **WHY THIS MATTERS**: Running a push from a script without `--yes` or
/// `--branch` must not commit to a guessed branch.
///
/// **BUG THIS CATCHES**: Would catch EOF treated as "use the default".
#[tokio::test]
async fn given_closed_input_when_push_dialog_then_cancelled() {
    // GIVEN
    let host = host(b"", options());

    // WHEN
    let settings = host.push_dialog(&github(), &[String::from("main")]).await;

    // THEN
    assert!(settings.is_none());
}
