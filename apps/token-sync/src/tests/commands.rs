// Unit tests for the local subcommands

use crate::commands::providers::providers;
use crate::commands::resolve::{ResolveOptions, resolve};
use crate::commands::sets::{render, sets};

use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

/// `core` feeds `semantic`; the `Light` theme marks `core` as a source.
fn write_document(dir: &Path) -> PathBuf {
    let path = dir.join("tokens.json");
    let document = json!({
        "values": {
            "core": [
                { "name": "colors.red", "type": "color", "value": "#ff0000" },
                { "name": "sizing.base", "type": "sizing", "value": 4 }
            ],
            "semantic": [
                { "name": "colors.primary", "type": "color", "value": "{colors.red}" },
                { "name": "sizing.gap", "type": "sizing", "value": "{sizing.base} * 2" },
                { "name": "colors.link", "type": "color", "value": "{colors.missing}" }
            ],
            "brand/light": [],
            "brand/dark": []
        },
        "themes": [
            {
                "id": "light",
                "name": "Light",
                "selectedTokenSets": { "core": "source", "semantic": "enabled" }
            }
        ],
        "usedTokenSet": { "core": "enabled", "semantic": "enabled", "brand/light": "source" }
    });
    std::fs::write(&path, serde_json::to_string_pretty(&document).expect("json")).expect("written");
    path
}

#[tokio::test]
async fn given_document_when_resolving_then_aliases_and_math_are_applied() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let path = write_document(dir.path());

    // WHEN
    let resolved = resolve(&path, ResolveOptions::default()).await.expect("resolved");

    // THEN
    assert_eq!(resolved["colors.primary"].value, json!("#ff0000"));
    assert_eq!(resolved["sizing.gap"].value, json!(8));
    assert!(resolved["colors.link"].is_broken());
    assert!(resolved.contains_key("colors.red"));
}

/// **VALUE**: Verifies `--exclude-sources` drops tokens owned by source sets
/// of the chosen theme.
///
/// **WHY THIS MATTERS**: Exported themes should only carry their own tokens;
/// source sets exist to feed references.
///
/// **BUG THIS CATCHES**: Would catch filtering against the document
/// selection instead of the theme, where `core` is enabled.
#[tokio::test]
async fn given_theme_with_source_set_when_excluding_sources_then_source_tokens_are_dropped() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let path = write_document(dir.path());

    // WHEN
    let resolved = resolve(
        &path,
        ResolveOptions {
            theme: Some("Light"),
            exclude_sources: true,
        },
    )
    .await
    .expect("resolved");

    // THEN: References into the source set still resolve
    assert!(!resolved.contains_key("colors.red"));
    assert!(!resolved.contains_key("sizing.base"));
    assert_eq!(resolved["colors.primary"].value, json!("#ff0000"));
    assert_eq!(resolved["sizing.gap"].value, json!(8));
}

#[tokio::test]
async fn given_no_theme_when_excluding_sources_then_document_selection_is_used() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_document(dir.path());

    let resolved = resolve(
        &path,
        ResolveOptions {
            theme: None,
            exclude_sources: true,
        },
    )
    .await
    .expect("resolved");

    assert!(resolved.contains_key("colors.red"));
}

#[tokio::test]
async fn given_missing_document_when_resolving_then_result_is_empty() {
    let dir = TempDir::new().expect("temp dir");

    let resolved = resolve(&dir.path().join("none.json"), ResolveOptions::default())
        .await
        .expect("resolved");

    assert!(resolved.is_empty());
}

#[tokio::test]
async fn given_nested_set_names_when_rendering_sets_then_folders_and_statuses_are_shown() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let path = write_document(dir.path());

    // WHEN
    let (tree, used) = sets(&path).await.expect("sets");
    let text = render(&tree, &used);

    // THEN
    assert_eq!(
        text,
        "core (enabled)\nsemantic (enabled)\nbrand/\n  light (source)\n  dark (disabled)"
    );
}

#[test]
fn given_empty_selection_when_rendering_then_every_set_is_enabled() {
    let tree = sync_core::graph::tree::token_set_tree(["global", "themes/dark"]);

    let text = render(&tree, &models::UsedTokenSets::new());

    assert_eq!(text, "global (enabled)\nthemes/\n  dark (enabled)");
}

#[test]
fn given_providers_file_when_listing_then_secret_variable_is_shown_not_value() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("providers.toml"),
        r#"
[[storage]]
internal_id = "gh-main"
name = "Design repo"
provider = "github"
id = "acme/tokens"
secret_env = "ACME_GITHUB_TOKEN"
"#,
    )
    .expect("written");

    // WHEN
    let listing = providers(dir.path()).expect("listed");

    // THEN
    assert_eq!(listing, "gh-main\tDesign repo\tGitHub\tacme/tokens\t$ACME_GITHUB_TOKEN");
}

#[test]
fn given_no_providers_file_when_listing_then_hint_is_returned() {
    let dir = TempDir::new().expect("temp dir");

    let listing = providers(dir.path()).expect("listed");

    assert!(listing.starts_with("No storage configured"), "got: {listing}");
}
