use crate::error::resolve::ResolveError;
use crate::resolve::alias::{AliasResolver, field_type};
use crate::resolve::expression;

use models::TokenType;

use serde_json::{Map, Value};

/// Flattens composition tokens into `{ property: value }` maps.
///
/// A property that references a composition or typography token is replaced
/// by that token's own resolved properties (one level). Shadow references
/// stay under their property key.
pub struct CompositionExpander<'r, 'g> {
    resolver: &'r mut AliasResolver<'g>,
}

impl<'r, 'g> CompositionExpander<'r, 'g> {
    pub fn new(resolver: &'r mut AliasResolver<'g>) -> Self {
        Self { resolver }
    }

    /// Expands the raw value of the composition token `name`.
    pub fn expand(&mut self, name: &str, raw: &Value) -> Result<Map<String, Value>, ResolveError> {
        match raw {
            Value::Object(properties) => self.expand_properties(properties),
            Value::Null => Ok(Map::new()),
            Value::String(text) => {
                let Some(reference) = expression::single_reference(raw) else {
                    return Err(ResolveError::not_a_composition(name));
                };

                // Surfaces cycles and missing targets before walking the chain.
                self.resolver.resolve_expression(text, TokenType::Composition)?;

                let graph = self.resolver.graph();
                match graph.token(reference) {
                    Some(target) if target.token_type == TokenType::Composition => {
                        self.expand(reference, &target.value)
                    }
                    _ => Err(ResolveError::not_a_composition(name)),
                }
            }
            _ => Err(ResolveError::not_a_composition(name)),
        }
    }

    fn expand_properties(
        &mut self,
        properties: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ResolveError> {
        let graph = self.resolver.graph();
        let mut expanded = Map::with_capacity(properties.len());

        for (property, raw_value) in properties {
            let nested = expression::single_reference(raw_value)
                .and_then(|reference| graph.token(reference).map(|token| (reference, token)))
                .filter(|(_, token)| {
                    matches!(
                        token.token_type,
                        TokenType::Composition | TokenType::Typography
                    )
                });

            if let Some((reference, _)) = nested {
                if let Value::Object(fields) = self.resolver.resolve_token(reference)? {
                    expanded.extend(fields);
                    continue;
                }
            }

            let property_type = field_type(property, TokenType::Composition);
            let value = self.resolver.resolve_value(raw_value, property_type)?;
            expanded.insert(property.clone(), value);
        }

        Ok(expanded)
    }
}
