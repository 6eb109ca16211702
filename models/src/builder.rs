use crate::error::model_error::ModelError;
use crate::{Token, TokenType};

use serde_json::Value;

/// Builder for creating validated Token instances.
///
/// Used by every local edit path so malformed names never reach the graph.
#[derive(Debug, Default)]
pub struct TokenBuilder {
    name: Option<String>,
    token_type: Option<TokenType>,
    value: Option<Value>,
    description: Option<String>,
}

impl TokenBuilder {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, token_type: TokenType) -> Self {
        self.token_type = Some(token_type);
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build the Token with validation.
    #[track_caller]
    pub fn build(self) -> Result<Token, ModelError> {
        let name = self
            .name
            .ok_or_else(|| ModelError::validation("Token name is required"))?;
        validate_token_name(&name)?;

        let token_type = self
            .token_type
            .ok_or_else(|| ModelError::validation("Token type is required"))?;

        let value = self
            .value
            .ok_or_else(|| ModelError::validation("Token value is required"))?;

        validate_value_shape(token_type, &value)?;

        Ok(Token {
            name,
            token_type,
            value,
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

/// Checks a dotted token path: non-empty segments, no whitespace and none
/// of the characters the alias grammar reserves.
#[track_caller]
pub fn validate_token_name(name: &str) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::validation("Token name cannot be empty"));
    }

    if name.split('.').any(str::is_empty) {
        return Err(ModelError::validation(format!(
            "Token name has an empty path segment: {name}"
        )));
    }

    if name.starts_with('$') || name.contains(['{', '}']) {
        return Err(ModelError::validation(format!(
            "Token name cannot contain alias syntax: {name}"
        )));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(ModelError::validation(format!(
            "Token name cannot contain whitespace: {name}"
        )));
    }

    Ok(())
}

#[track_caller]
fn validate_value_shape(token_type: TokenType, value: &Value) -> Result<(), ModelError> {
    let valid = match token_type {
        TokenType::Composition | TokenType::Typography => value.is_object() || value.is_string(),
        TokenType::BoxShadow | TokenType::Border => {
            value.is_object() || value.is_array() || value.is_string()
        }
        _ => !value.is_null() && !value.is_object(),
    };

    if !valid {
        return Err(ModelError::validation(format!(
            "Value shape does not match token type {token_type}"
        )));
    }

    Ok(())
}
