//! Errors raised while dereferencing aliases.
//!
//! None of these abort a merge. The merger turns each one into a
//! [`BrokenReference`] on the affected token and carries on.

use common::ErrorLocation;
use models::BrokenReference;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, Clone, ThisError)]
pub enum ResolveError {
    #[error("Circular Reference Error: {path:?} {location}")]
    CircularReference {
        path: Vec<String>,
        location: ErrorLocation,
    },

    #[error("Missing Reference Error: {reference} {location}")]
    MissingReference {
        reference: String,
        location: ErrorLocation,
    },

    #[error("Invalid Expression Error: {expression}: {reason} {location}")]
    InvalidExpression {
        expression: String,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Non Scalar In Template Error: {reference} {location}")]
    NonScalarInTemplate {
        reference: String,
        location: ErrorLocation,
    },

    #[error("Not A Composition Error: {name} {location}")]
    NotAComposition {
        name: String,
        location: ErrorLocation,
    },
}

impl ResolveError {
    #[track_caller]
    pub fn circular(path: Vec<String>) -> Self {
        ResolveError::CircularReference {
            path,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn missing(reference: impl Into<String>) -> Self {
        ResolveError::MissingReference {
            reference: reference.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn non_scalar_in_template(reference: impl Into<String>) -> Self {
        ResolveError::NonScalarInTemplate {
            reference: reference.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_a_composition(name: impl Into<String>) -> Self {
        ResolveError::NotAComposition {
            name: name.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The per-token sentinel this error degrades to.
    pub fn to_broken(&self) -> BrokenReference {
        match self {
            ResolveError::CircularReference { path, .. } => {
                BrokenReference::Circular { path: path.clone() }
            }
            ResolveError::MissingReference { reference, .. } => BrokenReference::Missing {
                reference: reference.clone(),
            },
            ResolveError::InvalidExpression { expression, .. } => {
                BrokenReference::InvalidExpression {
                    expression: expression.clone(),
                }
            }
            ResolveError::NonScalarInTemplate { reference, .. } => {
                BrokenReference::NonScalarInTemplate {
                    reference: reference.clone(),
                }
            }
            ResolveError::NotAComposition { name, .. } => BrokenReference::InvalidExpression {
                expression: name.clone(),
            },
        }
    }
}
