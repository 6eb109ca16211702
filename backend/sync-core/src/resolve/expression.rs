//! Alias expression grammar.
//!
//! ```text
//! expression  := reference | arithmetic | template | literal
//! reference   := "{" name "}" | "$" name
//! arithmetic  := reference WS? op WS? number        op := + - * /
//! template    := any string containing >= 1 reference among literal text
//! name        := segment ("." segment)*             segment := [A-Za-z0-9_-]+
//! ```

use crate::error::resolve::ResolveError;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Number, Value};

const REFERENCE: &str = r"\{([^{}\s]+)\}|\$([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)";

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(REFERENCE).expect("reference pattern is valid"));

static SINGLE_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*(?:{REFERENCE})\s*$")).expect("single reference pattern is valid")
});

static ARITHMETIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*(?:{REFERENCE})\s*([+\-*/])\s*(-?\d+(?:\.\d+)?)\s*$"
    ))
    .expect("arithmetic pattern is valid")
});

static DIMENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?|-?\.\d+)\s*([A-Za-z%]*)\s*$")
        .expect("dimension pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            "*" => Some(Operator::Multiply),
            "/" => Some(Operator::Divide),
            _ => None,
        }
    }
}

/// Parsed shape of one string value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression<'a> {
    /// No reference at all.
    Literal,
    /// The whole string is one reference.
    Reference(&'a str),
    /// `ref op number`.
    Arithmetic {
        reference: &'a str,
        operator: Operator,
        operand: f64,
    },
    /// References embedded in surrounding text.
    Template,
}

fn reference_name<'a>(captures: &Captures<'a>) -> Option<&'a str> {
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str())
}

pub fn parse(expression: &str) -> Expression<'_> {
    if let Some(captures) = SINGLE_REFERENCE_RE.captures(expression) {
        if let Some(name) = reference_name(&captures) {
            return Expression::Reference(name);
        }
    }

    if let Some(captures) = ARITHMETIC_RE.captures(expression) {
        let reference = reference_name(&captures);
        let operator = captures.get(3).and_then(|m| Operator::parse(m.as_str()));
        let operand = captures.get(4).and_then(|m| m.as_str().parse::<f64>().ok());

        if let (Some(reference), Some(operator), Some(operand)) = (reference, operator, operand) {
            return Expression::Arithmetic {
                reference,
                operator,
                operand,
            };
        }
    }

    if REFERENCE_RE.is_match(expression) {
        Expression::Template
    } else {
        Expression::Literal
    }
}

/// The referenced name when `value` is a string holding exactly one reference.
pub fn single_reference(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => match parse(text) {
            Expression::Reference(name) => Some(name),
            _ => None,
        },
        _ => None,
    }
}

/// Every reference name in `expression`, in order of appearance.
pub fn references(expression: &str) -> Vec<&str> {
    REFERENCE_RE
        .captures_iter(expression)
        .filter_map(|captures| reference_name(&captures))
        .collect()
}

/// Replaces each reference in `expression` with whatever `lookup` returns.
pub fn substitute<F>(expression: &str, mut lookup: F) -> Result<String, ResolveError>
where
    F: FnMut(&str) -> Result<String, ResolveError>,
{
    let mut output = String::with_capacity(expression.len());
    let mut last = 0;

    for captures in REFERENCE_RE.captures_iter(expression) {
        let (Some(whole), Some(name)) = (captures.get(0), reference_name(&captures)) else {
            continue;
        };
        output.push_str(&expression[last..whole.start()]);
        output.push_str(&lookup(name)?);
        last = whole.end();
    }

    output.push_str(&expression[last..]);
    Ok(output)
}

/// Text used when a resolved value is spliced into a template.
pub fn scalar_text(reference: &str, value: &Value) -> Result<String, ResolveError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => {
            Err(ResolveError::non_scalar_in_template(reference))
        }
    }
}

/// Splits `"4px"` into `(4.0, "px")`. JSON numbers have no unit.
pub fn parse_dimension(value: &Value) -> Option<(f64, String)> {
    match value {
        Value::Number(number) => number.as_f64().map(|n| (n, String::new())),
        Value::String(text) => {
            let captures = DIMENSION_RE.captures(text)?;
            let amount = captures.get(1)?.as_str().parse::<f64>().ok()?;
            let unit = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
            Some((amount, unit.to_string()))
        }
        _ => None,
    }
}

/// Evaluates `base op operand`, keeping the unit of `base`.
pub fn evaluate(
    expression: &str,
    base: &Value,
    operator: Operator,
    operand: f64,
) -> Result<Value, ResolveError> {
    let Some((amount, unit)) = parse_dimension(base) else {
        return Err(ResolveError::invalid_expression(
            expression,
            format!("{base} is not numeric"),
        ));
    };

    let result = match operator {
        Operator::Add => amount + operand,
        Operator::Subtract => amount - operand,
        Operator::Multiply => amount * operand,
        Operator::Divide => {
            if operand == 0.0 {
                return Err(ResolveError::invalid_expression(expression, "division by zero"));
            }
            amount / operand
        }
    };

    if !result.is_finite() {
        return Err(ResolveError::invalid_expression(expression, "result is not finite"));
    }

    let rounded = (result * 10_000.0).round() / 10_000.0;

    if unit.is_empty() {
        return Ok(number_value(rounded));
    }

    Ok(Value::String(format!("{}{unit}", format_number(rounded))))
}

fn number_value(amount: f64) -> Value {
    if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(amount as i64));
    }

    Number::from_f64(amount)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn format_number(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        return (amount as i64).to_string();
    }
    amount.to_string()
}

/// Rewrites references to `old` (or anything under `old.`) so they point at
/// `new`. Used when a token or group is renamed.
pub fn rewrite_references(value: &Value, old: &str, new: &str) -> Value {
    match value {
        Value::String(text) => Value::String(rewrite_text(text, old, new)),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), rewrite_references(field, old, new)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| rewrite_references(item, old, new))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn rewrite_text(text: &str, old: &str, new: &str) -> String {
    REFERENCE_RE
        .replace_all(text, |captures: &Captures| {
            let whole = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
            let Some(name) = reference_name(captures) else {
                return whole.to_string();
            };

            let renamed = if name == old {
                new.to_string()
            } else if let Some(rest) = name.strip_prefix(old).filter(|rest| rest.starts_with('.')) {
                format!("{new}{rest}")
            } else {
                return whole.to_string();
            };

            if captures.get(1).is_some() {
                format!("{{{renamed}}}")
            } else {
                format!("${renamed}")
            }
        })
        .into_owned()
}
