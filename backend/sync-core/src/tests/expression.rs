use crate::error::resolve::ResolveError;
use crate::resolve::expression::{
    Expression, Operator, evaluate, parse, parse_dimension, references, rewrite_references,
    substitute,
};

use serde_json::json;

#[test]
fn given_braced_and_dollar_forms_when_parsed_then_both_are_single_references() {
    assert_eq!(parse("{color.red}"), Expression::Reference("color.red"));
    assert_eq!(parse("  $sizing.xs "), Expression::Reference("sizing.xs"));
}

/// **VALUE**: Verifies `ref op number` is recognised as arithmetic, not a template.
///
/// **WHY THIS MATTERS**: `$sizing.xs * 2` must evaluate to a number for
/// numeric token types. Parsed as a template it would come out as the
/// string `"4 * 2"`.
///
/// **BUG THIS CATCHES**: Capture group numbering drifting when the
/// reference pattern gains or loses a group.
#[test]
fn given_reference_with_operator_when_parsed_then_arithmetic_is_returned() {
    // GIVEN
    let expression = "$sizing.xs * 2";

    // WHEN
    let parsed = parse(expression);

    // THEN
    assert_eq!(
        parsed,
        Expression::Arithmetic {
            reference: "sizing.xs",
            operator: Operator::Multiply,
            operand: 2.0,
        }
    );
}

#[test]
fn given_text_around_references_when_parsed_then_template_is_returned() {
    assert_eq!(parse("1px solid {color.border}"), Expression::Template);
    assert_eq!(parse("{a} {b}"), Expression::Template);
    assert_eq!(parse("#ff0000"), Expression::Literal);
    assert_eq!(parse("just text"), Expression::Literal);
}

#[test]
fn given_template_when_listing_references_then_order_of_appearance_is_kept() {
    let found = references("{shadow.x} {shadow.y} $color.black");

    assert_eq!(found, vec!["shadow.x", "shadow.y", "color.black"]);
}

#[test]
fn given_template_when_substituted_then_literal_text_is_preserved() {
    // GIVEN
    let template = "{space.sm} {space.lg}";

    // WHEN
    let result = substitute(template, |name| {
        Ok(match name {
            "space.sm" => String::from("4px"),
            _ => String::from("16px"),
        })
    });

    // THEN
    assert_eq!(result.expect("substitution succeeds"), "4px 16px");
}

#[test]
fn given_failing_lookup_when_substituted_then_error_is_propagated() {
    let result = substitute("a {missing} b", |name| Err(ResolveError::missing(name)));

    assert!(matches!(
        result,
        Err(ResolveError::MissingReference { ref reference, .. }) if reference == "missing"
    ));
}

#[test]
fn given_dimension_strings_when_parsed_then_amount_and_unit_are_split() {
    assert_eq!(parse_dimension(&json!("4px")), Some((4.0, String::from("px"))));
    assert_eq!(parse_dimension(&json!("1.5rem")), Some((1.5, String::from("rem"))));
    assert_eq!(parse_dimension(&json!("30%")), Some((30.0, String::from("%"))));
    assert_eq!(parse_dimension(&json!(12)), Some((12.0, String::new())));
    assert_eq!(parse_dimension(&json!("bold")), None);
    assert_eq!(parse_dimension(&json!({"x": 1})), None);
}

/// **VALUE**: Verifies arithmetic keeps the unit of its base value.
///
/// **WHY THIS MATTERS**: Designers write `{spacing.base} * 2` against
/// `"8px"` and expect `"16px"`, not a bare `16`.
///
/// **BUG THIS CATCHES**: Dropping the unit, or turning a unitless JSON
/// number into a string.
#[test]
fn given_base_with_unit_when_evaluated_then_unit_is_kept() {
    // GIVEN / WHEN
    let with_unit = evaluate("{a} * 2", &json!("4px"), Operator::Multiply, 2.0);
    let unitless = evaluate("{a} * 2", &json!(4), Operator::Multiply, 2.0);
    let fractional = evaluate("{a} / 4", &json!("1rem"), Operator::Divide, 4.0);

    // THEN
    assert_eq!(with_unit.expect("evaluates"), json!("8px"));
    assert_eq!(unitless.expect("evaluates"), json!(8));
    assert_eq!(fractional.expect("evaluates"), json!("0.25rem"));
}

#[test]
fn given_division_by_zero_when_evaluated_then_expression_is_invalid() {
    let result = evaluate("{a} / 0", &json!(4), Operator::Divide, 0.0);

    assert!(matches!(result, Err(ResolveError::InvalidExpression { .. })));
}

#[test]
fn given_non_numeric_base_when_evaluated_then_expression_is_invalid() {
    let result = evaluate("{a} + 1", &json!("bold"), Operator::Add, 1.0);

    assert!(matches!(result, Err(ResolveError::InvalidExpression { .. })));
}

/// **VALUE**: Verifies renames rewrite exact and nested references in both forms.
///
/// **WHY THIS MATTERS**: Renaming `color.primary` must keep every alias
/// pointing at it (and at `color.primary.500`) working.
///
/// **BUG THIS CATCHES**: Plain prefix matching that would also rewrite
/// `color.primaryDark`, or losing the `$` form.
#[test]
fn given_value_with_references_when_rewritten_then_only_matching_names_change() {
    // GIVEN
    let value = json!({
        "fill": "{color.primary}",
        "stroke": "$color.primary.500",
        "other": "{color.primaryDark}",
        "layers": ["1px solid {color.primary}"]
    });

    // WHEN
    let rewritten = rewrite_references(&value, "color.primary", "color.brand");

    // THEN
    assert_eq!(
        rewritten,
        json!({
            "fill": "{color.brand}",
            "stroke": "$color.brand.500",
            "other": "{color.primaryDark}",
            "layers": ["1px solid {color.brand}"]
        })
    );
}
