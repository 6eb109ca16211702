use crate::error::resolve::ResolveError;
use crate::graph::TokenGraph;
use crate::resolve::AliasResolver;

use models::{Token, TokenSet, TokenSets, TokenType};

use serde_json::{Value, json};

fn graph_of(tokens: Vec<Token>) -> TokenGraph {
    let mut sets = TokenSets::new();
    sets.insert(String::from("global"), TokenSet::from(tokens));
    TokenGraph::from_token_sets(&sets)
}

/// **VALUE**: Verifies the canonical arithmetic alias scenario.
///
/// **WHY THIS MATTERS**: `sizing.sm = "$sizing.xs * 2"` over `sizing.xs = 4`
/// is the most common derived-token pattern; it must come out as the
/// number 8.
///
/// **BUG THIS CATCHES**: Returning the template string or a float `8.0`.
#[test]
fn given_arithmetic_alias_when_resolved_then_numeric_result_is_returned() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("sizing.xs", TokenType::Sizing, json!(4)),
        Token::new("sizing.sm", TokenType::Sizing, json!("$sizing.xs * 2")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let value = resolver.resolve_token("sizing.sm");

    // THEN
    assert_eq!(value.expect("resolves"), json!(8));
}

#[test]
fn given_alias_chain_when_resolved_then_final_value_is_returned() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("color.base.red", TokenType::Color, json!("#ff0000")),
        Token::new("color.brand", TokenType::Color, json!("{color.base.red}")),
        Token::new("color.button", TokenType::Color, json!("$color.brand")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let value = resolver.resolve_token("color.button");

    // THEN
    assert_eq!(value.expect("resolves"), json!("#ff0000"));
}

/// **VALUE**: Verifies a reference may point at a token declared later.
///
/// **WHY THIS MATTERS**: Authors do not order tokens by dependency, and the
/// merged graph interleaves sets.
///
/// **BUG THIS CATCHES**: A single forward pass that only sees earlier tokens.
#[test]
fn given_forward_reference_when_resolved_then_declaration_order_does_not_matter() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("spacing.lg", TokenType::Spacing, json!("{spacing.base} * 4")),
        Token::new("spacing.base", TokenType::Spacing, json!("4px")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let value = resolver.resolve_token("spacing.lg");

    // THEN
    assert_eq!(value.expect("resolves"), json!("16px"));
}

/// **VALUE**: Verifies cycles terminate and name the loop.
///
/// **WHY THIS MATTERS**: A cycle between two tokens must not hang or blow
/// the stack; both members are reported broken.
///
/// **BUG THIS CATCHES**: Missing cycle detection (stack overflow) or a
/// cycle reported only on the first member.
#[test]
fn given_two_token_cycle_when_resolved_then_both_report_circular_reference() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("a", TokenType::Sizing, json!("{b}")),
        Token::new("b", TokenType::Sizing, json!("{a}")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let first = resolver.resolve_token("a");
    let second = resolver.resolve_token("b");

    // THEN
    match first {
        Err(ResolveError::CircularReference { path, .. }) => {
            assert_eq!(path, vec!["a", "b", "a"]);
        }
        other => panic!("expected circular reference, got {other:?}"),
    }
    assert!(matches!(second, Err(ResolveError::CircularReference { .. })));
}

#[test]
fn given_self_reference_when_resolved_then_circular_reference_is_returned() {
    let graph = graph_of(vec![Token::new("loop", TokenType::Opacity, json!("{loop} * 2"))]);
    let mut resolver = AliasResolver::new(&graph);

    let result = resolver.resolve_token("loop");

    assert!(matches!(result, Err(ResolveError::CircularReference { .. })));
}

#[test]
fn given_unknown_reference_when_resolved_then_missing_reference_names_it() {
    // GIVEN
    let graph = graph_of(vec![Token::new("color.text", TokenType::Color, json!("{color.nope}"))]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let result = resolver.resolve_token("color.text");

    // THEN
    assert!(matches!(
        result,
        Err(ResolveError::MissingReference { ref reference, .. }) if reference == "color.nope"
    ));
}

#[test]
fn given_reference_into_object_token_when_resolved_then_field_is_returned() {
    // GIVEN: A typography token and a reference to one of its fields
    let graph = graph_of(vec![
        Token::new("font.size.lg", TokenType::FontSizes, json!("24px")),
        Token::new(
            "type.heading",
            TokenType::Typography,
            json!({"fontSize": "{font.size.lg}", "fontWeight": "700"}),
        ),
        Token::new("size.title", TokenType::FontSizes, json!("{type.heading.fontSize}")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let value = resolver.resolve_token("size.title");

    // THEN
    assert_eq!(value.expect("resolves"), json!("24px"));
}

#[test]
fn given_shadow_layers_when_resolved_then_each_layer_resolves_in_order() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("color.shadow", TokenType::Color, json!("#00000040")),
        Token::new("blur.sm", TokenType::Dimension, json!(4)),
        Token::new(
            "shadow.card",
            TokenType::BoxShadow,
            json!([
                {"x": 0, "y": 1, "blur": "{blur.sm}", "color": "{color.shadow}"},
                {"x": 0, "y": 4, "blur": "{blur.sm} * 2", "color": "{color.shadow}"}
            ]),
        ),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let value = resolver.resolve_token("shadow.card");

    // THEN
    assert_eq!(
        value.expect("resolves"),
        json!([
            {"x": 0, "y": 1, "blur": 4, "color": "#00000040"},
            {"x": 0, "y": 4, "blur": 8, "color": "#00000040"}
        ])
    );
}

#[test]
fn given_color_type_when_expression_has_operator_then_it_is_kept_as_template() {
    // GIVEN: Colors never do arithmetic
    let graph = graph_of(vec![
        Token::new("alpha", TokenType::Opacity, json!("50%")),
        Token::new("color.label", TokenType::Color, json!("{alpha} * 2")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let value = resolver.resolve_token("color.label");

    // THEN
    assert_eq!(value.expect("resolves"), json!("50% * 2"));
}

#[test]
fn given_object_inside_template_when_resolved_then_non_scalar_error_is_returned() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("type.body", TokenType::Typography, json!({"fontSize": "16px"})),
        Token::new("label", TokenType::Other, json!("font: {type.body}")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    // WHEN
    let result = resolver.resolve_token("label");

    // THEN
    assert!(matches!(result, Err(ResolveError::NonScalarInTemplate { .. })));
}

#[test]
fn given_plain_values_when_resolved_then_they_pass_through_unchanged() {
    let graph = graph_of(vec![
        Token::new("flag", TokenType::Other, json!(true)),
        Token::new("weight", TokenType::FontWeights, json!("Bold")),
    ]);
    let mut resolver = AliasResolver::new(&graph);

    assert_eq!(resolver.resolve_token("flag").expect("resolves"), Value::Bool(true));
    assert_eq!(resolver.resolve_token("weight").expect("resolves"), json!("Bold"));
}
