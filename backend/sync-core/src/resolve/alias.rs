//! Alias dereferencing over a [`TokenGraph`] snapshot.
//!
//! # Cycle handling
//!
//! The resolver keeps the chain of token names currently being resolved. A
//! name that reappears on that chain fails with a circular reference naming
//! the loop, and every frame on the loop caches the failure, so each token
//! in a cycle ends up broken and nothing recurses twice.

use crate::error::resolve::ResolveError;
use crate::graph::TokenGraph;
use crate::resolve::expression::{self, Expression};

use models::TokenType;

use std::collections::HashMap;

use serde_json::Value;

/// One resolution pass. Cheap to create; holds no state beyond its memo.
pub struct AliasResolver<'g> {
    graph: &'g TokenGraph,
    memo: HashMap<String, Result<Value, ResolveError>>,
    stack: Vec<String>,
}

impl<'g> AliasResolver<'g> {
    pub fn new(graph: &'g TokenGraph) -> Self {
        Self {
            graph,
            memo: HashMap::new(),
            stack: Vec::new(),
        }
    }

    pub fn graph(&self) -> &'g TokenGraph {
        self.graph
    }

    /// Fully dereferenced value of the named token.
    pub fn resolve_token(&mut self, name: &str) -> Result<Value, ResolveError> {
        if let Some(result) = self.memo.get(name) {
            return result.clone();
        }

        if let Some(start) = self.stack.iter().position(|frame| frame == name) {
            let mut path = self.stack[start..].to_vec();
            path.push(name.to_string());
            return Err(ResolveError::circular(path));
        }

        let graph = self.graph;
        let Some(entry) = graph.get(name) else {
            return self.resolve_field_path(name);
        };

        self.stack.push(name.to_string());
        let result = self.resolve_value(&entry.token.value, entry.token.token_type);
        self.stack.pop();

        self.memo.insert(name.to_string(), result.clone());
        result
    }

    /// Resolves a raw value as if it belonged to a token of `token_type`.
    ///
    /// Objects resolve field by field and arrays element by element; the
    /// container shape is preserved.
    pub fn resolve_value(&mut self, raw: &Value, token_type: TokenType) -> Result<Value, ResolveError> {
        match raw {
            Value::String(text) => self.resolve_expression(text, token_type),
            Value::Object(fields) => {
                let mut resolved = serde_json::Map::with_capacity(fields.len());
                for (key, field) in fields {
                    let field_type = field_type(key, token_type);
                    resolved.insert(key.clone(), self.resolve_value(field, field_type)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item, token_type))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    pub fn resolve_expression(
        &mut self,
        text: &str,
        token_type: TokenType,
    ) -> Result<Value, ResolveError> {
        match expression::parse(text) {
            Expression::Literal => Ok(Value::String(text.to_string())),
            Expression::Reference(reference) => self.resolve_token(reference),
            Expression::Arithmetic {
                reference,
                operator,
                operand,
            } if token_type.allows_arithmetic() => {
                let base = self.resolve_token(reference)?;
                expression::evaluate(text, &base, operator, operand)
            }
            Expression::Arithmetic { .. } | Expression::Template => {
                let substituted = expression::substitute(text, |reference| {
                    let value = self.resolve_token(reference)?;
                    expression::scalar_text(reference, &value)
                })?;
                Ok(Value::String(substituted))
            }
        }
    }

    /// `a.b.c` where `a.b` is an object-valued token reads field `c`.
    fn resolve_field_path(&mut self, name: &str) -> Result<Value, ResolveError> {
        let graph = self.graph;

        for (split, _) in name.rmatch_indices('.') {
            let prefix = &name[..split];
            if !graph.contains(prefix) {
                continue;
            }

            let mut value = self.resolve_token(prefix)?;
            for field in name[split + 1..].split('.') {
                value = match value {
                    Value::Object(mut fields) => fields
                        .remove(field)
                        .ok_or_else(|| ResolveError::missing(name))?,
                    _ => return Err(ResolveError::missing(name)),
                };
            }
            return Ok(value);
        }

        Err(ResolveError::missing(name))
    }
}

/// Object fields named after a token type (`fontSizes`, `color`, ...) follow
/// that type's arithmetic rules; anything else inherits the parent's.
pub(crate) fn field_type(key: &str, parent: TokenType) -> TokenType {
    match serde_json::from_value::<TokenType>(Value::String(key.to_string())) {
        Ok(TokenType::Other) | Err(_) => match key {
            "fontFamily" => TokenType::FontFamilies,
            "fontWeight" => TokenType::FontWeights,
            "fontSize" => TokenType::FontSizes,
            "lineHeight" => TokenType::LineHeights,
            "textCase" => TokenType::TextCase,
            "textDecoration" => TokenType::TextDecoration,
            _ => parent,
        },
        Ok(token_type) => token_type,
    }
}
