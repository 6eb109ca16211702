use crate::error::resolve::ResolveError;
use crate::graph::TokenGraph;
use crate::resolve::{AliasResolver, CompositionExpander};

use models::{Token, TokenSet, TokenSets, TokenType};

use serde_json::{Value, json};

fn graph_of(tokens: Vec<Token>) -> TokenGraph {
    let mut sets = TokenSets::new();
    sets.insert(String::from("global"), TokenSet::from(tokens));
    TokenGraph::from_token_sets(&sets)
}

fn expand(graph: &TokenGraph, name: &str) -> Result<Value, ResolveError> {
    let raw = graph
        .token(name)
        .map(|token| token.value.clone())
        .unwrap_or(Value::Null);
    let mut resolver = AliasResolver::new(graph);
    CompositionExpander::new(&mut resolver)
        .expand(name, &raw)
        .map(Value::Object)
}

/// **VALUE**: Verifies the canonical composition scenario.
///
/// **WHY THIS MATTERS**: A composition of `opacity.30` and `fontSizes.4`
/// must come out as `{opacity: "30%", fontSizes: "4px"}` for the renderer
/// to apply both properties.
///
/// **BUG THIS CATCHES**: Properties left as alias strings, or percentage and
/// pixel units being dropped.
#[test]
fn given_composition_of_aliases_when_expanded_then_properties_are_resolved() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("opacity.30", TokenType::Opacity, json!("30%")),
        Token::new("fontSizes.4", TokenType::FontSizes, json!("4px")),
        Token::new(
            "composition.card",
            TokenType::Composition,
            json!({"opacity": "{opacity.30}", "fontSizes": "{fontSizes.4}"}),
        ),
    ]);

    // WHEN
    let expanded = expand(&graph, "composition.card");

    // THEN
    assert_eq!(
        expanded.expect("expands"),
        json!({"opacity": "30%", "fontSizes": "4px"})
    );
}

#[test]
fn given_property_pointing_at_typography_when_expanded_then_its_fields_are_inlined() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("font.size.md", TokenType::FontSizes, json!("16px")),
        Token::new(
            "type.body",
            TokenType::Typography,
            json!({"fontSize": "{font.size.md}", "fontWeight": "400"}),
        ),
        Token::new(
            "composition.paragraph",
            TokenType::Composition,
            json!({"typography": "{type.body}", "paragraphSpacing": "8px"}),
        ),
    ]);

    // WHEN
    let expanded = expand(&graph, "composition.paragraph");

    // THEN
    assert_eq!(
        expanded.expect("expands"),
        json!({"fontSize": "16px", "fontWeight": "400", "paragraphSpacing": "8px"})
    );
}

#[test]
fn given_shadow_property_when_expanded_then_layers_stay_under_their_key() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new(
            "shadow.sm",
            TokenType::BoxShadow,
            json!([{"x": 0, "y": 1, "blur": 2, "color": "#000"}]),
        ),
        Token::new(
            "composition.raised",
            TokenType::Composition,
            json!({"boxShadow": "{shadow.sm}"}),
        ),
    ]);

    // WHEN
    let expanded = expand(&graph, "composition.raised");

    // THEN
    assert_eq!(
        expanded.expect("expands"),
        json!({"boxShadow": [{"x": 0, "y": 1, "blur": 2, "color": "#000"}]})
    );
}

#[test]
fn given_composition_aliasing_another_composition_when_expanded_then_target_is_used() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("composition.base", TokenType::Composition, json!({"sizing": "8px"})),
        Token::new("composition.alias", TokenType::Composition, json!("{composition.base}")),
    ]);

    // WHEN
    let expanded = expand(&graph, "composition.alias");

    // THEN
    assert_eq!(expanded.expect("expands"), json!({"sizing": "8px"}));
}

#[test]
fn given_composition_aliasing_a_scalar_when_expanded_then_it_is_not_a_composition() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("spacing.sm", TokenType::Spacing, json!("4px")),
        Token::new("composition.bad", TokenType::Composition, json!("{spacing.sm}")),
    ]);

    // WHEN
    let result = expand(&graph, "composition.bad");

    // THEN
    assert!(matches!(result, Err(ResolveError::NotAComposition { .. })));
}

#[test]
fn given_composition_with_missing_alias_when_expanded_then_missing_reference_is_returned() {
    let graph = graph_of(vec![Token::new(
        "composition.card",
        TokenType::Composition,
        json!({"opacity": "{opacity.nope}"}),
    )]);

    let result = expand(&graph, "composition.card");

    assert!(matches!(result, Err(ResolveError::MissingReference { .. })));
}

#[test]
fn given_empty_composition_when_expanded_then_map_is_empty() {
    // GIVEN
    let graph = graph_of(vec![
        Token::new("composition.blank", TokenType::Composition, json!({})),
        Token::new("composition.unset", TokenType::Composition, Value::Null),
    ]);

    // WHEN
    let blank = expand(&graph, "composition.blank");
    let unset = expand(&graph, "composition.unset");

    // THEN
    assert_eq!(blank.expect("empty object expands"), json!({}));
    assert_eq!(unset.expect("null expands"), json!({}));
}
