//! `run_sync` end to end: providers.toml, a document file and a JSONBin
//! served by wiremock.

use token_sync::commands::sync::{SyncKind, SyncReport, run_sync};
use token_sync::error::AppError;
use token_sync::host::{PromptOptions, TerminalHost};

use sync_core::config::AppConfig;
use sync_core::error::ConfigError;
use sync_core::storage::{AdapterFactory, AdapterOptions, DefaultAdapterFactory};
use sync_core::sync::SyncHost;

use models::StorageProvider;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    dir: TempDir,
    document: PathBuf,
}

impl Fixture {
    fn new(server: &MockServer, secret_env: Option<&str>) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let secret_line = secret_env
            .map(|variable| format!("secret_env = \"{variable}\"\n"))
            .unwrap_or_default();
        std::fs::write(
            dir.path().join("providers.toml"),
            format!(
                "[[storage]]\n\
                 internal_id = \"bin\"\n\
                 name = \"Design bin\"\n\
                 provider = \"jsonbin\"\n\
                 id = \"bin-1\"\n\
                 base_url = \"{}\"\n\
                 {secret_line}",
                server.uri()
            ),
        )
        .expect("providers written");
        let document = dir.path().join("tokens.json");
        Self { dir, document }
    }

    fn config_dir(&self) -> &Path {
        self.dir.path()
    }

    fn with_local_tokens(self) -> Self {
        let document = json!({
            "values": {
                "global": [
                    { "name": "sizing.xs", "type": "sizing", "value": 6 },
                    { "name": "sizing.sm", "type": "sizing", "value": "{sizing.xs} * 2" }
                ]
            }
        });
        std::fs::write(&self.document, document.to_string()).expect("document written");
        self
    }

    fn saved(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(&self.document).expect("document read"))
            .expect("document is JSON")
    }

    async fn run(&self, kind: SyncKind, provider: &str) -> Result<SyncReport, AppError> {
        let host: Arc<dyn SyncHost> = Arc::new(TerminalHost::new(
            &b""[..],
            tokio::io::sink(),
            PromptOptions {
                assume_yes: true,
                default_commit_message: String::from("Update tokens"),
                ..PromptOptions::default()
            },
        ));
        let factory: Arc<dyn AdapterFactory> =
            Arc::new(DefaultAdapterFactory::new(AdapterOptions::default()));

        run_sync(
            kind,
            provider,
            &self.document,
            self.config_dir(),
            &AppConfig::default(),
            host,
            factory,
        )
        .await
    }
}

fn remote_record() -> Value {
    json!({
        "record": {
            "version": "1",
            "updatedAt": "2024-06-01T12:00:00Z",
            "values": {
                "global": [
                    { "name": "sizing.xs", "type": "sizing", "value": 4 },
                    { "name": "sizing.sm", "type": "sizing", "value": "$sizing.xs * 2" }
                ]
            },
            "$themes": [],
            "$metadata": { "tokenSetOrder": ["global"] }
        }
    })
}

async fn serve_latest(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/b/bin-1/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn accept_put(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/b/bin-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "record": {} })))
        .expect(1)
        .mount(server)
        .await;
}

/// **VALUE**: Verifies a pull lands in the document file.
///
/// **WHY THIS MATTERS**: The command is only useful if the next `resolve`
/// sees the pulled tokens and the storage the document came from.
///
/// **BUG THIS CATCHES**: Would catch the store being updated but never
/// written back, or the storage type dropped on the way out.
#[tokio::test]
async fn given_empty_document_when_pulling_then_remote_tokens_are_saved() {
    // GIVEN
    let server = MockServer::start().await;
    serve_latest(&server, remote_record()).await;
    let fixture = Fixture::new(&server, None);

    // WHEN
    let report = fixture.run(SyncKind::Pull, "bin").await.expect("pull succeeds");

    // THEN
    assert_eq!(report.outcome, "applied");
    assert_eq!(report.provider, "Design bin");

    let saved = fixture.saved();
    assert_eq!(saved["values"]["global"][0]["value"], json!(4));
    assert_eq!(saved["updatedAt"], json!("2024-06-01T12:00:00Z"));
    assert_eq!(saved["storageType"]["provider"], json!("jsonbin"));
    assert_eq!(saved["storageType"]["id"], json!("bin-1"));
}

#[tokio::test]
async fn given_different_local_tokens_when_pushing_then_bin_is_updated() {
    // GIVEN
    let server = MockServer::start().await;
    serve_latest(&server, remote_record()).await;
    accept_put(&server).await;
    let fixture = Fixture::new(&server, None).with_local_tokens();

    // WHEN: Looked up by name this time
    let report = fixture.run(SyncKind::Push, "Design bin").await.expect("push succeeds");

    // THEN
    assert_eq!(report.outcome, "pushed");
    assert!(report.pull_request_url.is_none());
    assert_eq!(fixture.saved()["values"]["global"][0]["value"], json!(6));
}

#[tokio::test]
async fn given_identical_tokens_when_pulling_then_nothing_to_commit() {
    let server = MockServer::start().await;
    serve_latest(&server, remote_record()).await;
    let fixture = Fixture::new(&server, None);
    fixture.run(SyncKind::Pull, "bin").await.expect("first pull");

    let report = fixture.run(SyncKind::Pull, "bin").await.expect("second pull");

    assert_eq!(report.outcome, "nothing-to-commit");
}

/// **VALUE**: Verifies restore seeds an empty bin from local tokens.
///
/// **WHY THIS MATTERS**: A freshly created bin has no values; restoring
/// against it must upload local work, not report an empty remote.
///
/// **BUG THIS CATCHES**: Would catch restore stopping at `RemoteEmpty` when
/// local tokens exist.
#[tokio::test]
async fn given_empty_bin_and_local_tokens_when_restoring_then_bin_is_seeded() {
    // GIVEN
    let server = MockServer::start().await;
    serve_latest(&server, json!({ "record": { "version": "1" } })).await;
    accept_put(&server).await;
    let fixture = Fixture::new(&server, None).with_local_tokens();

    // WHEN
    let report = fixture.run(SyncKind::Restore, "bin").await.expect("restore succeeds");

    // THEN
    assert_eq!(report.outcome, "seeded-pushed");
}

#[tokio::test]
async fn given_rejected_key_when_restoring_then_unreachable_error_keeps_document() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/bin-1/latest"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let fixture = Fixture::new(&server, None).with_local_tokens();
    let before = fixture.saved();

    // WHEN
    let result = fixture.run(SyncKind::Restore, "bin").await;

    // THEN
    assert!(matches!(result, Err(AppError::App { .. })));
    assert_eq!(fixture.saved(), before);
}

#[tokio::test]
async fn given_rejected_key_when_pulling_then_credential_code_is_reported() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/bin-1/latest"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let fixture = Fixture::new(&server, None);

    // WHEN
    let error = fixture.run(SyncKind::Pull, "bin").await.expect_err("pull fails");

    // THEN
    assert_eq!(
        error.error_code().as_deref(),
        Some(StorageProvider::JsonBin.credential_error_code())
    );
    assert!(!fixture.document.exists(), "failed pulls write nothing");
}

#[tokio::test]
async fn given_unknown_provider_when_syncing_then_provider_not_found() {
    let server = MockServer::start().await;
    let fixture = Fixture::new(&server, None);

    let result = fixture.run(SyncKind::Pull, "nope").await;

    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::ProviderNotFound { .. }))
    ));
}

/// **VALUE**: Verifies an unset secret variable fails before any request.
///
/// **WHY THIS MATTERS**: Sending an empty key to the remote produces a
/// confusing credential error instead of naming the missing variable.
///
/// **BUG THIS CATCHES**: Would catch `secret_env` silently falling back to
/// an empty secret.
#[tokio::test]
async fn given_unset_secret_variable_when_syncing_then_secret_missing_and_no_request() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let fixture = Fixture::new(&server, Some("TOKEN_SYNC_TEST_UNSET_BIN_KEY"));

    // WHEN
    let result = fixture.run(SyncKind::Pull, "bin").await;

    // THEN
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::SecretMissing { .. }))
    ));
}
