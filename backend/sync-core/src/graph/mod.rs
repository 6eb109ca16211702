//! Flattened view over token sets used by the resolver.
//!
//! A `TokenGraph` is built once per resolution pass from an ordered list of
//! sets. Later sets override earlier same-named entries, but a name keeps the
//! position where it was first seen.

pub mod edit;
pub mod tree;

use models::{Token, TokenSet, TokenSets};

use indexmap::IndexMap;

/// A token plus the set its winning definition came from.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEntry {
    pub token: Token,
    pub set: String,
}

#[derive(Debug, Clone, Default)]
pub struct TokenGraph {
    entries: IndexMap<String, GraphEntry>,
}

impl TokenGraph {
    /// Flattens `sets` in iteration order.
    pub fn from_sets<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a TokenSet)>,
    {
        let mut entries: IndexMap<String, GraphEntry> = IndexMap::new();

        for (set_name, set) in sets {
            for token in set {
                // IndexMap::insert keeps the original slot for an existing key.
                entries.insert(
                    token.name.clone(),
                    GraphEntry {
                        token: token.clone(),
                        set: set_name.to_string(),
                    },
                );
            }
        }

        Self { entries }
    }

    /// Flattens every set of a document in declared order.
    pub fn from_token_sets(sets: &TokenSets) -> Self {
        Self::from_sets(sets.iter().map(|(name, set)| (name.as_str(), set)))
    }

    pub fn get(&self, name: &str) -> Option<&GraphEntry> {
        self.entries.get(name)
    }

    pub fn token(&self, name: &str) -> Option<&Token> {
        self.entries.get(name).map(|entry| &entry.token)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GraphEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
