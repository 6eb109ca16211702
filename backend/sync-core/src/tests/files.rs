use crate::error::storage::{GIT_MULTIFILE_PERMISSION_ERROR, StorageError};
use crate::storage::files::{
    FileLayout, RemoteFile, checked_token_set, decode_document, encode_document,
    flatten_token_set, nest_token_set,
};

use models::{
    RemoteTokenData, StorageProvider, ThemeObject, Token, TokenSet, TokenSetStatus, TokenSets,
    TokenType,
};

use serde_json::json;

fn data() -> RemoteTokenData {
    let mut tokens = TokenSets::new();
    tokens.insert(
        String::from("global"),
        TokenSet::from(vec![
            Token::new("sizing.xs", TokenType::Sizing, json!(4)),
            Token::new("sizing.sm", TokenType::Sizing, json!("$sizing.xs * 2")),
        ]),
    );
    tokens.insert(
        String::from("brand/light"),
        TokenSet::from(vec![Token::new("color.bg", TokenType::Color, json!("#fff"))]),
    );
    RemoteTokenData::new(tokens).with_themes(vec![
        ThemeObject::new("light", "Light").with_set("global", TokenSetStatus::Enabled),
    ])
}

#[test]
fn given_no_path_when_resolving_layout_then_default_single_file_is_used() {
    let layout = FileLayout::resolve(StorageProvider::GitHub, None, false).expect("layout");

    assert_eq!(layout, FileLayout::SingleFile(String::from("tokens.json")));
}

/// **VALUE**: Verifies directory paths need the multi-file entitlement.
///
/// **WHY THIS MATTERS**: Without it the host must show the dedicated
/// permission message, not a generic connection failure.
///
/// **BUG THIS CATCHES**: Silently writing a single file into a directory
/// path, or mapping the failure to the wrong code.
#[test]
fn given_directory_path_without_multi_file_when_resolving_then_permission_error() {
    // GIVEN / WHEN
    let result = FileLayout::resolve(StorageProvider::GitLab, Some("tokens/"), false);

    // THEN
    let error = result.expect_err("directory needs multi-file");
    assert!(matches!(error, StorageError::MultiFilePermission { .. }));
    assert_eq!(error.error_message(), GIT_MULTIFILE_PERMISSION_ERROR);
}

#[test]
fn given_directory_layout_when_checking_ownership_then_only_json_below_it_counts() {
    let layout = FileLayout::resolve(StorageProvider::GitHub, Some("/tokens"), true).expect("layout");

    assert!(layout.is_multi_file());
    assert!(layout.owns("tokens/global.json"));
    assert!(layout.owns("/tokens/brand/light.json"));
    assert!(!layout.owns("tokens/README.md"));
    assert!(!layout.owns("tokens-old/global.json"));
}

#[test]
fn given_token_set_when_nested_then_dotted_names_become_groups() {
    // GIVEN
    let set = TokenSet::from(vec![
        Token::new("sizing.xs", TokenType::Sizing, json!(4)),
        Token::new("color.red", TokenType::Color, json!("#f00")),
    ]);

    // WHEN
    let nested = nest_token_set(&set);

    // THEN
    assert_eq!(
        nested,
        json!({
            "sizing": {"xs": {"value": 4, "type": "sizing"}},
            "color": {"red": {"value": "#f00", "type": "color"}}
        })
    );
}

#[test]
fn given_nested_file_without_types_when_flattened_then_type_defaults_to_other() {
    // GIVEN
    let nested = json!({
        "spacing": {
            "base": {"value": "4px", "type": "spacing", "description": "Grid unit"},
            "legacy": {"value": "3px"}
        }
    });

    // WHEN
    let set = flatten_token_set("global", &nested);

    // THEN
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["spacing.base", "spacing.legacy"]);
    let base = set.get("spacing.base").expect("base token");
    assert_eq!(base.token_type, TokenType::Spacing);
    assert_eq!(base.description.as_deref(), Some("Grid unit"));
    assert_eq!(
        set.get("spacing.legacy").map(|t| t.token_type),
        Some(TokenType::Other)
    );
}

/// **VALUE**: A dotted key and a nested path naming the same token resolve
/// to a single token instead of two entries fighting over one name.
///
/// **BUG THIS CATCHES**: Dropping the earlier definition from its slot, or
/// failing the whole pull over one repeated name.
#[test]
fn given_same_token_dotted_and_nested_when_flattened_then_later_definition_wins_in_place() {
    // GIVEN
    let nested = json!({
        "sizing.xs": {"value": 4, "type": "sizing"},
        "color": {"red": {"value": "#ff0000", "type": "color"}},
        "sizing": {"xs": {"value": 8, "type": "sizing"}}
    });

    // WHEN
    let set = flatten_token_set("global", &nested);

    // THEN
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["sizing.xs", "color.red"]);
    assert_eq!(set.get("sizing.xs").map(|t| &t.value), Some(&json!(8)));
}

#[test]
fn given_invalid_token_name_when_collected_then_token_is_kept() {
    // GIVEN
    let tokens = vec![
        Token::new("spacing..base", TokenType::Spacing, json!("4px")),
        Token::new("spacing.lg", TokenType::Spacing, json!("16px")),
    ];

    // WHEN
    let set = checked_token_set("global", tokens);

    // THEN
    assert_eq!(set.len(), 2);
    assert!(set.contains("spacing..base"));
}

/// **VALUE**: Verifies single-file documents carry themes and set order.
///
/// **WHY THIS MATTERS**: Set order drives merge order; reading a document
/// back in a different order changes resolved values.
///
/// **BUG THIS CATCHES**: Reserved keys decoded as token sets, or set order
/// lost on read.
#[test]
fn given_single_file_when_encoded_and_decoded_then_sets_themes_and_order_survive() {
    // GIVEN
    let data = data();
    let layout = FileLayout::SingleFile(String::from("design/tokens.json"));

    // WHEN
    let files = layout.encode(&data).expect("encodes");
    let decoded = layout.decode(&files).expect("decodes");

    // THEN
    assert_eq!(files.len(), 1);
    assert!(files[0].content.contains("\"$themes\""));
    assert!(files[0].content.contains("\n  \"global\""));
    assert_eq!(decoded.tokens, data.tokens);
    assert_eq!(decoded.themes, data.themes);
    assert_eq!(
        decoded.metadata.token_set_order,
        vec![String::from("global"), String::from("brand/light")]
    );
}

#[test]
fn given_directory_layout_when_encoded_then_one_file_per_set_plus_reserved_files() {
    // GIVEN
    let layout = FileLayout::Directory(String::from("tokens"));

    // WHEN
    let files = layout.encode(&data()).expect("encodes");

    // THEN
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "tokens/global.json",
            "tokens/brand/light.json",
            "tokens/$themes.json",
            "tokens/$metadata.json"
        ]
    );
}

#[test]
fn given_directory_files_without_metadata_when_decoded_then_sets_sort_by_name() {
    // GIVEN
    let layout = FileLayout::Directory(String::from("tokens"));
    let files = vec![
        RemoteFile::new("tokens/zeta.json", r#"{"a": {"value": 1, "type": "sizing"}}"#),
        RemoteFile::new("tokens/alpha.json", r#"{"b": {"value": 2, "type": "sizing"}}"#),
        RemoteFile::new("tokens/notes.txt", "ignored"),
    ];

    // WHEN
    let decoded = layout.decode(&files).expect("decodes");

    // THEN
    let order: Vec<&str> = decoded.tokens.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["alpha", "zeta"]);
}

#[test]
fn given_document_with_metadata_order_when_decoded_then_order_is_applied() {
    // GIVEN
    let document = json!({
        "b": {"x": {"value": 1, "type": "sizing"}},
        "a": {"y": {"value": 2, "type": "sizing"}},
        "$metadata": {"tokenSetOrder": ["b", "a"]},
        "$unknown": {}
    });

    // WHEN
    let decoded = decode_document(&document).expect("decodes");

    // THEN
    let order: Vec<&str> = decoded.tokens.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["b", "a"]);
    assert!(decoded.themes.is_empty());
}

#[test]
fn given_non_object_document_when_decoded_then_payload_error() {
    let result = decode_document(&json!(["not", "a", "document"]));

    assert!(matches!(result, Err(StorageError::Payload { .. })));
}

#[test]
fn given_encoded_document_when_inspected_then_metadata_lists_set_order() {
    let document = encode_document(&data());

    assert_eq!(
        document["$metadata"],
        json!({"tokenSetOrder": ["global", "brand/light"]})
    );
}
