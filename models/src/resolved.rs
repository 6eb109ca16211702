use crate::TokenType;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a token could not be dereferenced.
///
/// A broken token is still part of the output; renderers flag it and show
/// the raw expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BrokenReference {
    Missing { reference: String },
    Circular { path: Vec<String> },
    InvalidExpression { expression: String },
    NonScalarInTemplate { reference: String },
}

impl std::fmt::Display for BrokenReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokenReference::Missing { reference } => write!(f, "missing reference {reference}"),
            BrokenReference::Circular { path } => {
                write!(f, "circular reference {}", path.join(" -> "))
            }
            BrokenReference::InvalidExpression { expression } => {
                write!(f, "invalid expression {expression}")
            }
            BrokenReference::NonScalarInTemplate { reference } => {
                write!(f, "non-scalar {reference} used inside a string")
            }
        }
    }
}

/// Output of one resolution pass. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedToken {
    pub name: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Dereferenced value, or the raw expression when broken.
    pub value: Value,
    /// The authored expression, present only when it differs from `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set the winning definition came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken: Option<BrokenReference>,
}

impl ResolvedToken {
    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }
}

/// Resolved tokens keyed by name, in first-seen order.
pub type ResolvedTokens = IndexMap<String, ResolvedToken>;
