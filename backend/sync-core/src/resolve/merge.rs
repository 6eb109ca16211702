use crate::graph::{GraphEntry, TokenGraph};
use crate::resolve::alias::AliasResolver;
use crate::resolve::composition::CompositionExpander;

use models::{ResolvedToken, ResolvedTokens, ThemeObject, TokenSetStatus, TokenSets, TokenType, UsedTokenSets};

use log::{debug, warn};
use serde_json::Value;

/// Combines token sets selected by a theme into one resolved mapping.
///
/// Source sets are merged first, then enabled sets, each group in declared
/// order. A later set replaces a same-named token wholesale. Resolution
/// failures degrade the affected token only.
pub struct TokenSetMerger<'a> {
    sets: &'a TokenSets,
}

impl<'a> TokenSetMerger<'a> {
    pub fn new(sets: &'a TokenSets) -> Self {
        Self { sets }
    }

    /// Set names in merge order. Sets missing from the document are skipped.
    pub fn merge_order(&self, used: &UsedTokenSets) -> Vec<&'a str> {
        let sources = used
            .iter()
            .filter(|(_, status)| **status == TokenSetStatus::Source);
        let enabled = used
            .iter()
            .filter(|(_, status)| **status == TokenSetStatus::Enabled);

        sources
            .chain(enabled)
            .filter_map(|(name, _)| match self.sets.get_key_value(name) {
                Some((key, _)) => Some(key.as_str()),
                None => {
                    warn!("Token set '{}' is selected but does not exist, skipping", name);
                    None
                }
            })
            .collect()
    }

    pub fn graph(&self, used: &UsedTokenSets) -> TokenGraph {
        let order = self.merge_order(used);
        TokenGraph::from_sets(
            order
                .into_iter()
                .filter_map(|name| self.sets.get(name).map(|set| (name, set))),
        )
    }

    pub fn merge(&self, used: &UsedTokenSets) -> ResolvedTokens {
        resolve_graph(&self.graph(used))
    }

    pub fn merge_theme(&self, theme: &ThemeObject) -> ResolvedTokens {
        debug!("Merging theme '{}' ({})", theme.name, theme.id);
        self.merge(&theme.selected_token_sets)
    }

    /// Every set enabled, in document order.
    pub fn merge_all(&self) -> ResolvedTokens {
        resolve_graph(&TokenGraph::from_token_sets(self.sets))
    }
}

/// Resolves every entry of `graph`, expanding composition tokens.
pub fn resolve_graph(graph: &TokenGraph) -> ResolvedTokens {
    let mut resolver = AliasResolver::new(graph);
    let mut resolved = ResolvedTokens::with_capacity(graph.len());
    let mut broken = 0usize;

    for (name, entry) in graph.iter() {
        let token = resolve_entry(&mut resolver, name, entry);
        if token.is_broken() {
            broken += 1;
        }
        resolved.insert(name.to_string(), token);
    }

    if broken > 0 {
        warn!("{} of {} tokens have broken references", broken, resolved.len());
    }

    resolved
}

fn resolve_entry(resolver: &mut AliasResolver<'_>, name: &str, entry: &GraphEntry) -> ResolvedToken {
    let raw = &entry.token.value;

    let result = if entry.token.token_type == TokenType::Composition {
        CompositionExpander::new(resolver)
            .expand(name, raw)
            .map(Value::Object)
    } else {
        resolver.resolve_token(name)
    };

    let (value, raw_value, broken) = match result {
        Ok(value) => {
            let raw_value = (value != *raw).then(|| raw.clone());
            (value, raw_value, None)
        }
        Err(error) => {
            debug!("Token '{}' is broken: {}", name, error);
            (raw.clone(), Some(raw.clone()), Some(error.to_broken()))
        }
    };

    ResolvedToken {
        name: name.to_string(),
        token_type: entry.token.token_type,
        value,
        raw_value,
        description: entry.token.description.clone(),
        set: Some(entry.set.clone()),
        broken,
    }
}

/// Drops tokens whose winning definition comes from a source set.
pub fn without_source_tokens(resolved: ResolvedTokens, used: &UsedTokenSets) -> ResolvedTokens {
    resolved
        .into_iter()
        .filter(|(_, token)| {
            token
                .set
                .as_deref()
                .and_then(|set| used.get(set))
                .is_none_or(|status| *status != TokenSetStatus::Source)
        })
        .collect()
}
