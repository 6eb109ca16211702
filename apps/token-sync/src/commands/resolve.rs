use super::open_state;
use crate::error::AppError;

use sync_core::resolve::without_source_tokens;

use models::{ResolvedTokens, UsedTokenSets};

use std::path::Path;

use log::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions<'a> {
    /// Theme id or name; falls back to the configured active theme.
    pub theme: Option<&'a str>,
    pub exclude_sources: bool,
}

pub async fn resolve(document: &Path, options: ResolveOptions<'_>) -> Result<ResolvedTokens, AppError> {
    let (_, state) = open_state(document).await?;

    let resolved = state.resolve_with_theme(options.theme);
    let broken = resolved.values().filter(|token| token.is_broken()).count();
    if broken > 0 {
        warn!("{} of {} tokens have broken references", broken, resolved.len());
    }
    info!("Resolved {} tokens from {}", resolved.len(), document.display());

    if !options.exclude_sources {
        return Ok(resolved);
    }

    let selection: UsedTokenSets = options
        .theme
        .and_then(|wanted| {
            state
                .themes
                .iter()
                .find(|theme| theme.id == wanted || theme.name == wanted)
        })
        .or_else(|| state.active_theme_object())
        .map(|theme| theme.selected_token_sets.clone())
        .unwrap_or_else(|| state.used_token_sets.clone());

    Ok(without_source_tokens(resolved, &selection))
}
