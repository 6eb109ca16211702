use crate::error::edit::EditError;
use crate::graph::edit::{
    create_token, delete_token, delete_token_group, duplicate_token, duplicate_token_group,
    edit_token, rename_token_group,
};

use models::{Token, TokenSet, TokenSets, TokenType};

use serde_json::json;

fn sets() -> TokenSets {
    let mut sets = TokenSets::new();
    sets.insert(
        String::from("global"),
        TokenSet::from(vec![
            Token::new("color.primary", TokenType::Color, json!("#0055ff")),
            Token::new("color.primary.hover", TokenType::Color, json!("#0044cc")),
            Token::new("sizing.xs", TokenType::Sizing, json!(4)),
            Token::new("spacing.xs", TokenType::Spacing, json!("{sizing.xs}")),
        ]),
    );
    sets.insert(
        String::from("light"),
        TokenSet::from(vec![Token::new(
            "color.button",
            TokenType::Color,
            json!("{color.primary.hover}"),
        )]),
    );
    sets
}

fn names(sets: &TokenSets, set: &str) -> Vec<String> {
    sets.get(set)
        .map(|tokens| tokens.names().map(str::to_string).collect())
        .unwrap_or_default()
}

#[test]
fn given_new_set_name_when_creating_token_then_set_is_created() {
    // GIVEN
    let mut sets = sets();

    // WHEN
    let result = create_token(
        &mut sets,
        "dark",
        Token::new("color.bg", TokenType::Color, json!("#111")),
    );

    // THEN
    assert!(result.is_ok());
    assert_eq!(names(&sets, "dark"), vec!["color.bg"]);
}

#[test]
fn given_existing_name_when_creating_token_then_token_exists_error() {
    let mut sets = sets();

    let result = create_token(
        &mut sets,
        "global",
        Token::new("sizing.xs", TokenType::Sizing, json!(8)),
    );

    assert!(matches!(result, Err(EditError::TokenExists { .. })));
    assert_eq!(sets["global"].get("sizing.xs").map(|t| &t.value), Some(&json!(4)));
}

#[test]
fn given_invalid_name_when_creating_token_then_invalid_token_error() {
    let mut sets = sets();

    let result = create_token(
        &mut sets,
        "global",
        Token::new("bad name", TokenType::Sizing, json!(8)),
    );

    assert!(matches!(result, Err(EditError::InvalidToken { .. })));
}

/// **VALUE**: Verifies renaming a token keeps its slot and fixes aliases in
/// every set.
///
/// **WHY THIS MATTERS**: Renames are the main way references break in
/// practice. Tokens in other sets pointing at the old name must follow.
///
/// **BUG THIS CATCHES**: Rename implemented as delete + append (token jumps
/// to the end), or alias rewriting limited to the edited set.
#[test]
fn given_renamed_token_when_editing_then_position_and_aliases_follow() {
    // GIVEN
    let mut sets = sets();
    let renamed = Token::new("sizing.tiny", TokenType::Sizing, json!(4));

    // WHEN
    let result = edit_token(&mut sets, "global", renamed, Some("sizing.xs"));

    // THEN
    assert!(result.is_ok());
    assert_eq!(
        names(&sets, "global"),
        vec!["color.primary", "color.primary.hover", "sizing.tiny", "spacing.xs"]
    );
    assert_eq!(
        sets["global"].get("spacing.xs").map(|t| &t.value),
        Some(&json!("{sizing.tiny}"))
    );
}

#[test]
fn given_rename_onto_existing_name_when_editing_then_nothing_changes() {
    let mut sets = sets();
    let before = sets.clone();

    let result = edit_token(
        &mut sets,
        "global",
        Token::new("color.primary", TokenType::Sizing, json!(4)),
        Some("sizing.xs"),
    );

    assert!(matches!(result, Err(EditError::TokenExists { .. })));
    assert_eq!(sets, before);
}

#[test]
fn given_unknown_set_when_deleting_token_then_set_not_found() {
    let mut sets = sets();

    let result = delete_token(&mut sets, "nope", "sizing.xs");

    assert!(matches!(result, Err(EditError::SetNotFound { .. })));
}

#[test]
fn given_token_when_duplicated_then_copy_follows_original() {
    // GIVEN
    let mut sets = sets();

    // WHEN
    let copy = duplicate_token(&mut sets, "global", "sizing.xs", None);

    // THEN
    assert_eq!(copy.expect("duplicates"), "sizing.xs-copy");
    assert_eq!(
        names(&sets, "global"),
        vec![
            "color.primary",
            "color.primary.hover",
            "sizing.xs",
            "sizing.xs-copy",
            "spacing.xs"
        ]
    );
}

#[test]
fn given_group_and_type_when_deleting_group_then_only_matching_tokens_go() {
    // GIVEN
    let mut sets = sets();
    create_token(
        &mut sets,
        "global",
        Token::new("color.primary.label", TokenType::Other, json!("Primary")),
    )
    .expect("created");

    // WHEN
    let removed = delete_token_group(&mut sets, "global", "color.primary", Some(TokenType::Color));

    // THEN
    assert_eq!(removed.expect("deleted"), 2);
    assert_eq!(
        names(&sets, "global"),
        vec!["sizing.xs", "spacing.xs", "color.primary.label"]
    );
}

/// **VALUE**: Verifies group renames move every member and every alias.
///
/// **WHY THIS MATTERS**: Renaming `color.primary` to `color.brand` touches
/// the group token itself, its children, and references in other sets.
///
/// **BUG THIS CATCHES**: Prefix matching without a segment boundary, or
/// forgetting references in sets other than the edited one.
#[test]
fn given_group_when_renamed_then_members_and_aliases_move() {
    // GIVEN
    let mut sets = sets();

    // WHEN
    let renamed = rename_token_group(&mut sets, "global", "color", "primary", "brand");

    // THEN
    assert_eq!(renamed.expect("renamed"), 2);
    assert_eq!(
        names(&sets, "global"),
        vec!["color.brand", "color.brand.hover", "sizing.xs", "spacing.xs"]
    );
    assert_eq!(
        sets["light"].get("color.button").map(|t| &t.value),
        Some(&json!("{color.brand.hover}"))
    );
}

#[test]
fn given_interleaved_group_when_renamed_then_each_member_keeps_its_slot() {
    // GIVEN
    let mut sets = TokenSets::new();
    sets.insert(
        String::from("global"),
        TokenSet::from(vec![
            Token::new("sizing.xs", TokenType::Sizing, json!(4)),
            Token::new("color.red", TokenType::Color, json!("#ff0000")),
            Token::new("sizing.sm", TokenType::Sizing, json!("{sizing.xs}")),
        ]),
    );

    // WHEN
    let renamed = rename_token_group(&mut sets, "global", "", "sizing", "size");

    // THEN
    assert_eq!(renamed.expect("renamed"), 2);
    assert_eq!(names(&sets, "global"), vec!["size.xs", "color.red", "size.sm"]);
    assert_eq!(
        sets["global"].get("size.sm").map(|t| &t.value),
        Some(&json!("{size.xs}"))
    );
}

#[test]
fn given_missing_group_when_renamed_then_token_not_found() {
    let mut sets = sets();

    let result = rename_token_group(&mut sets, "global", "color", "secondary", "accent");

    assert!(matches!(result, Err(EditError::TokenNotFound { .. })));
}

#[test]
fn given_group_when_duplicated_then_copies_follow_the_group() {
    // GIVEN
    let mut sets = sets();

    // WHEN
    let copied = duplicate_token_group(&mut sets, "global", "color", "primary");

    // THEN
    assert_eq!(copied.expect("duplicated"), 2);
    assert_eq!(
        names(&sets, "global"),
        vec![
            "color.primary",
            "color.primary.hover",
            "color.primary-copy",
            "color.primary-copy.hover",
            "sizing.xs",
            "spacing.xs"
        ]
    );
}
