// Unit tests for the file-backed document storage

use crate::document::FileDocumentStorage;
use crate::error::AppError;

use sync_core::sync::{DocumentStorage, document_keys, load_document, write_document};

use models::{Token, TokenDocument, TokenSet, TokenSets, TokenType};

use serde_json::{Value, json};
use tempfile::TempDir;

fn sample_document() -> TokenDocument {
    let mut sets = TokenSets::new();
    sets.insert(
        String::from("global"),
        TokenSet::from(vec![Token::new("colors.primary", TokenType::Color, json!("#ff0000"))]),
    );
    TokenDocument::new(sets)
}

#[tokio::test]
async fn given_missing_file_when_opening_then_document_is_empty() {
    let dir = TempDir::new().expect("temp dir");

    let storage = FileDocumentStorage::open(dir.path().join("tokens.json"))
        .await
        .expect("opened");

    assert!(storage.get(document_keys::VALUES).await.expect("read").is_none());
    assert!(!storage.path().exists(), "opening must not create the file");
}

#[tokio::test]
async fn given_array_file_when_opening_then_document_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "[1, 2, 3]").expect("written");

    let result = FileDocumentStorage::open(&path).await;

    assert!(matches!(result, Err(AppError::Document { .. })));
}

#[tokio::test]
async fn given_unparsable_file_when_opening_then_document_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "{ values: ").expect("written");

    let result = FileDocumentStorage::open(&path).await;

    assert!(matches!(result, Err(AppError::Document { .. })));
}

/// **VALUE**: Verifies a written document survives a reopen.
///
/// **WHY THIS MATTERS**: Every sync command writes the document back; if the
/// keys did not land in the file, a pull would silently be lost.
///
/// **BUG THIS CATCHES**: Would catch values stored as JSON strings instead
/// of JSON (double encoding), or the temp file never being renamed.
#[tokio::test]
async fn given_written_document_when_reopened_then_it_loads_back() {
    // GIVEN: A document written into a nested path
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("design").join("tokens.json");
    let storage = FileDocumentStorage::open(&path).await.expect("opened");
    let document = sample_document();

    // WHEN: Writing and reopening
    let failed = write_document(&storage, &document).await;
    let reopened = FileDocumentStorage::open(&path).await.expect("reopened");
    let loaded = load_document(&reopened).await.expect("loaded");

    // THEN: Nothing failed, the file is plain JSON, the document is identical
    assert!(failed.is_empty(), "failed keys: {failed:?}");
    assert!(!path.with_extension("json.tmp").exists());

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(raw["values"]["global"][0]["name"], json!("colors.primary"));

    assert_eq!(loaded.values, document.values);
}

#[tokio::test]
async fn given_invalid_json_value_when_setting_then_host_document_error() {
    let dir = TempDir::new().expect("temp dir");
    let storage = FileDocumentStorage::open(dir.path().join("tokens.json"))
        .await
        .expect("opened");

    let result = storage.set(document_keys::THEMES, "not json").await;

    assert!(result.is_err());
    assert!(storage.get(document_keys::THEMES).await.expect("read").is_none());
}
