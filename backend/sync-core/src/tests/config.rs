use crate::config::{AppConfig, CONFIG_DIR_ENV, ProvidersConfig, default_config_dir};
use crate::error::config::ConfigError;

use models::StorageProvider;

use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

#[test]
fn given_missing_config_file_when_loading_then_defaults_are_returned() {
    let dir = TempDir::new().expect("temp dir");

    let config = AppConfig::load(dir.path()).expect("defaults");

    assert_eq!(config, AppConfig::default());
    assert!(config.sync.update_remote);
    assert_eq!(config.sync.request_timeout_secs, 30);
}

/// **VALUE**: Verifies a saved config loads back identically.
///
/// **WHY THIS MATTERS**: The save path writes a temp file and renames it; a
/// broken rename would lose settings on every save.
///
/// **BUG THIS CATCHES**: Temp file left behind or serde field renames that
/// do not round-trip.
#[test]
fn given_saved_config_when_loading_then_values_are_kept() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let mut config = AppConfig::default();
    config.sync.multi_file = true;
    config.sync.request_timeout_secs = 90;
    config.tokens.active_theme = Some(String::from("Dark"));

    // WHEN
    config.save(dir.path()).expect("saved");
    let loaded = AppConfig::load(dir.path()).expect("loaded");

    // THEN
    assert_eq!(loaded, config);
    assert!(!dir.path().join("config.json.tmp").exists());
    assert!(loaded.adapter_options().multi_file);
    assert_eq!(loaded.adapter_options().request_timeout, Duration::from_secs(90));
}

#[test]
fn given_corrupt_config_when_loading_then_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("config.json"), "{ not json").expect("written");

    let result = AppConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_invalid_values_when_validating_then_validation_error() {
    let mut zero_timeout = AppConfig::default();
    zero_timeout.sync.request_timeout_secs = 0;

    let mut blank_message = AppConfig::default();
    blank_message.sync.default_commit_message = String::from("  ");

    let mut blank_theme = AppConfig::default();
    blank_theme.tokens.active_theme = Some(String::new());

    for config in [zero_timeout, blank_message, blank_theme] {
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}

#[test]
#[serial]
fn given_config_dir_override_when_resolving_dir_then_override_is_used() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    // SAFETY: serialised with the other env tests
    unsafe { std::env::set_var(CONFIG_DIR_ENV, dir.path()) };

    // WHEN
    let resolved = default_config_dir();

    // THEN
    unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
    assert_eq!(resolved.expect("dir"), dir.path());
}

const PROVIDERS: &str = r#"
[[storage]]
internal_id = "gh-main"
name = "Design tokens"
provider = "github"
id = "acme/tokens"
branch = "main"
file_path = "tokens"
secret_env = "TOKEN_SYNC_TEST_GITHUB_SECRET"

[[storage]]
internal_id = "public"
name = "Public url"
provider = "url"
id = "https://example.com/tokens.json"
"#;

#[test]
#[serial]
fn given_providers_file_when_loading_then_entries_build_contexts() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("providers.toml"), PROVIDERS).expect("written");
    unsafe { std::env::set_var("TOKEN_SYNC_TEST_GITHUB_SECRET", "ghp_test") };

    // WHEN
    let providers = ProvidersConfig::load(dir.path()).expect("loaded");
    let context = providers
        .find("Design tokens")
        .and_then(|entry| entry.to_context());

    // THEN
    unsafe { std::env::remove_var("TOKEN_SYNC_TEST_GITHUB_SECRET") };
    let context = context.expect("context");
    assert_eq!(providers.entries.len(), 2);
    assert_eq!(context.provider, StorageProvider::GitHub);
    assert_eq!(context.internal_id.as_deref(), Some("gh-main"));
    assert_eq!(context.file_path.as_deref(), Some("tokens"));
    assert_eq!(context.secret.expose(), "ghp_test");
}

#[test]
#[serial]
fn given_unset_secret_variable_when_building_context_then_secret_missing() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("providers.toml"), PROVIDERS).expect("written");
    unsafe { std::env::remove_var("TOKEN_SYNC_TEST_GITHUB_SECRET") };
    let providers = ProvidersConfig::load(dir.path()).expect("loaded");

    // WHEN
    let result = providers.find("gh-main").and_then(|entry| entry.to_context());

    // THEN
    assert!(matches!(result, Err(ConfigError::SecretMissing { .. })));
}

#[test]
fn given_unknown_key_when_finding_provider_then_provider_not_found() {
    let providers = ProvidersConfig::default();

    assert!(matches!(
        providers.find("nope"),
        Err(ConfigError::ProviderNotFound { .. })
    ));
}

#[test]
fn given_git_entry_without_repository_when_loading_then_validation_error() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("providers.toml");
    std::fs::write(
        &path,
        "[[storage]]\ninternal_id = \"x\"\nname = \"X\"\nprovider = \"gitlab\"\n",
    )
    .expect("written");

    // WHEN
    let result = ProvidersConfig::load_from_path(&path);

    // THEN
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}
