use crate::{StorageProvider, SyncContext, SyncResult};

#[test]
fn given_provider_names_when_deserialized_then_match_wire_spelling() {
    let providers: Vec<StorageProvider> =
        serde_json::from_str(r#"["github","gitlab","bitbucket","ado","jsonbin","url","local"]"#)
            .expect("valid providers");

    assert_eq!(
        providers,
        vec![
            StorageProvider::GitHub,
            StorageProvider::GitLab,
            StorageProvider::Bitbucket,
            StorageProvider::Ado,
            StorageProvider::JsonBin,
            StorageProvider::Url,
            StorageProvider::Local,
        ]
    );
}

/// **VALUE**: Verifies each provider reports its own credential error code.
///
/// **WHY THIS MATTERS**: Hosts switch on these exact strings to show
/// "check your GitHub token" versus "check your JSONBin key".
#[test]
fn given_provider_when_requesting_credential_code_then_code_is_provider_specific() {
    assert_eq!(StorageProvider::GitHub.credential_error_code(), "GITHUB_CREDENTIAL_ERROR");
    assert_eq!(StorageProvider::Ado.credential_error_code(), "ADO_CREDENTIAL_ERROR");
    assert_eq!(StorageProvider::Url.credential_error_code(), "URL_CREDENTIAL_ERROR");
    assert!(StorageProvider::Bitbucket.is_git());
    assert!(!StorageProvider::JsonBin.is_git());
}

#[test]
fn given_context_when_debug_printed_then_secret_is_hidden() {
    // GIVEN
    let context = SyncContext::new(StorageProvider::GitHub, "acme/tokens")
        .with_branch("main")
        .with_secret("ghp_hidden_value");

    // WHEN
    let printed = format!("{context:?}");

    // THEN
    assert!(printed.contains("acme/tokens"));
    assert!(!printed.contains("ghp_hidden_value"));
}

#[test]
fn given_failure_result_when_reading_message_then_returns_code() {
    let result = SyncResult::failure("EMPTY_BRANCH_ERROR");

    assert!(!result.is_success());
    assert_eq!(result.error_message(), Some("EMPTY_BRANCH_ERROR"));
}
