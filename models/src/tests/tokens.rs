use crate::{Token, TokenSet, TokenType};

use serde_json::json;

/// **VALUE**: Verifies a token set round-trips through JSON keeping declared order.
///
/// **WHY THIS MATTERS**: Output ordering of the merger follows the order
/// tokens were declared, and the push diff compares serialised strings. A
/// reordering on load would show every pull as "changed".
///
/// **BUG THIS CATCHES**: Would catch a switch to a hashed map.
#[test]
fn given_token_array_when_deserialized_then_order_is_preserved() {
    // GIVEN: Tokens in non-alphabetical order
    let raw = json!([
        {"name": "sizing.xl", "type": "sizing", "value": 32},
        {"name": "sizing.xs", "type": "sizing", "value": 4},
        {"name": "color.red", "type": "color", "value": "#ff0000", "description": "Brand red"}
    ]);

    // WHEN
    let set: TokenSet = serde_json::from_value(raw.clone()).expect("valid set");

    // THEN: Same order, same array shape when written back
    let names: Vec<&str> = set.names().collect();
    assert_eq!(names, vec!["sizing.xl", "sizing.xs", "color.red"]);
    assert_eq!(serde_json::to_value(&set).expect("serialise"), raw);
}

#[test]
fn given_unknown_type_when_deserialized_then_falls_back_to_other() {
    // GIVEN
    let raw = json!({"name": "misc.thing", "type": "somethingNew", "value": "x"});

    // WHEN
    let token: Token = serde_json::from_value(raw).expect("valid token");

    // THEN
    assert_eq!(token.token_type, TokenType::Other);
}

#[test]
fn given_set_when_inserting_at_index_then_following_tokens_shift() {
    // GIVEN
    let mut set: TokenSet = vec![
        Token::new("a", TokenType::Sizing, json!(1)),
        Token::new("c", TokenType::Sizing, json!(3)),
    ]
    .into();

    // WHEN
    set.insert_at(1, Token::new("b", TokenType::Sizing, json!(2)));
    set.remove("a");

    // THEN
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["b", "c"]);
    assert_eq!(set.position("c"), Some(1));
}

#[test]
fn given_group_path_when_checking_membership_then_prefix_must_end_on_segment() {
    let token = Token::new("color.primary.500", TokenType::Color, json!("#000"));

    assert!(token.is_in_group("color"));
    assert!(token.is_in_group("color.primary"));
    assert!(!token.is_in_group("color.prim"));
    assert!(!token.is_in_group("colors"));
}

#[test]
fn given_types_when_checking_arithmetic_then_color_like_types_are_excluded() {
    assert!(TokenType::Sizing.allows_arithmetic());
    assert!(TokenType::Opacity.allows_arithmetic());
    assert!(!TokenType::Color.allows_arithmetic());
    assert!(!TokenType::FontFamilies.allows_arithmetic());
    assert!(TokenType::Composition.is_object_type());
    assert!(!TokenType::Sizing.is_object_type());
}
