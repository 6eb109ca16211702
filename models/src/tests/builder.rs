use crate::{ModelError, TokenBuilder, TokenType, validate_token_name};

use serde_json::json;

/// **VALUE**: Verifies the builder rejects names with empty path segments.
///
/// **WHY THIS MATTERS**: Token names are dotted paths used by aliases and by
/// the group operations. `sizing..xs` would never be reachable from `$sizing.xs`
/// and would break group renames.
///
/// **BUG THIS CATCHES**: Would catch if segment validation is removed.
#[test]
fn given_empty_segment_when_building_token_then_returns_validation_error() {
    // GIVEN: A name with a double dot
    let builder = TokenBuilder::default()
        .with_name("sizing..xs")
        .with_type(TokenType::Sizing)
        .with_value(4);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Validation error mentions the segment
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert!(message.contains("empty path segment"), "got: {message}");
        }
        Ok(token) => panic!("expected validation error, got {token:?}"),
    }
}

#[test]
fn given_alias_syntax_in_name_when_validating_then_rejected() {
    assert!(validate_token_name("{color.red}").is_err());
    assert!(validate_token_name("$color").is_err());
    assert!(validate_token_name("color red").is_err());
    assert!(validate_token_name("").is_err());
    assert!(validate_token_name("color.red-500").is_ok());
}

#[test]
fn given_missing_value_when_building_then_returns_validation_error() {
    // GIVEN: No value
    let builder = TokenBuilder::default()
        .with_name("color.red")
        .with_type(TokenType::Color);

    // WHEN
    let result = builder.build();

    // THEN
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Token value is required");
        }
        Ok(token) => panic!("expected validation error, got {token:?}"),
    }
}

/// **VALUE**: Verifies that an object value on a scalar type is rejected.
///
/// **BUG THIS CATCHES**: Would catch a composition body being stored under a
/// `sizing` token, which the arithmetic evaluator would then reject at
/// resolution time with a confusing broken reference.
#[test]
fn given_object_value_for_scalar_type_when_building_then_returns_validation_error() {
    // GIVEN
    let builder = TokenBuilder::default()
        .with_name("sizing.sm")
        .with_type(TokenType::Sizing)
        .with_value(json!({"width": 4}));

    // WHEN / THEN
    assert!(builder.build().is_err());
}

#[test]
fn given_valid_composition_when_building_then_token_keeps_raw_value() {
    // GIVEN
    let builder = TokenBuilder::default()
        .with_name("composition.card")
        .with_type(TokenType::Composition)
        .with_value(json!({"opacity": "$opacity.30", "fontSizes": "{fontSizes.4}"}))
        .with_description("");

    // WHEN
    let token = builder.build().expect("valid token");

    // THEN: Raw aliases are kept and an empty description is dropped
    assert_eq!(token.raw_value()["opacity"], json!("$opacity.30"));
    assert_eq!(token.description, None);
}
