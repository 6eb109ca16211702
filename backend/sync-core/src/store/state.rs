use crate::resolve::TokenSetMerger;

use models::{
    DOCUMENT_VERSION, RemoteTokenData, ResolvedTokens, StorageType, SyncContext, ThemeObject,
    Token, TokenDocument, TokenSetStatus, TokenSets, UsedTokenSets,
};

use indexmap::IndexMap;
use log::warn;

/// Everything the store knows about one document.
#[derive(Debug, Clone, Default)]
pub struct TokenState {
    pub tokens: TokenSets,
    pub themes: Vec<ThemeObject>,
    pub used_token_sets: UsedTokenSets,
    pub active_theme: Option<String>,
    /// Serialised token values as of the last successful pull or push.
    pub last_synced_state: String,
    pub updated_at: Option<String>,
    pub check_for_changes: bool,
    pub edit_prohibited: bool,
    pub api: Option<SyncContext>,
}

/// Replacement payload for [`crate::store::StoreCommand::SetTokenData`].
#[derive(Debug, Clone, Default)]
pub struct TokenData {
    pub tokens: TokenSets,
    pub themes: Vec<ThemeObject>,
    /// When `None` the current selection is kept, minus vanished sets, and
    /// new sets are enabled.
    pub used_token_sets: Option<UsedTokenSets>,
    pub active_theme: Option<String>,
    pub updated_at: Option<String>,
}

impl From<RemoteTokenData> for TokenData {
    fn from(remote: RemoteTokenData) -> Self {
        Self {
            tokens: remote.tokens,
            themes: remote.themes,
            used_token_sets: None,
            active_theme: None,
            updated_at: remote.updated_at,
        }
    }
}

/// Canonical text used to decide whether local and remote tokens differ.
///
/// Tokens are sorted by name inside each set: the nested file layout groups
/// tokens by path, so a round trip through a remote does not keep the
/// authored order.
pub fn serialize_token_values(tokens: &TokenSets) -> String {
    let canonical: IndexMap<&str, Vec<&Token>> = tokens
        .iter()
        .map(|(set_name, set)| {
            let mut sorted: Vec<&Token> = set.iter().collect();
            sorted.sort_by(|a, b| a.name.cmp(&b.name));
            (set_name.as_str(), sorted)
        })
        .collect();

    match serde_json::to_string_pretty(&canonical) {
        Ok(serialized) => serialized,
        Err(e) => {
            warn!("Failed to serialise token values: {}", e);
            String::new()
        }
    }
}

impl TokenState {
    pub fn from_document(document: TokenDocument) -> Self {
        Self {
            tokens: document.values,
            themes: document.themes,
            used_token_sets: document.used_token_sets,
            active_theme: document.active_theme,
            last_synced_state: String::new(),
            updated_at: document.updated_at,
            check_for_changes: document.check_for_changes,
            edit_prohibited: false,
            api: None,
        }
    }

    pub fn to_document(&self) -> TokenDocument {
        TokenDocument {
            version: String::from(DOCUMENT_VERSION),
            updated_at: self.updated_at.clone(),
            check_for_changes: self.check_for_changes,
            active_theme: self.active_theme.clone(),
            used_token_sets: self.used_token_sets.clone(),
            themes: self.themes.clone(),
            values: self.tokens.clone(),
            storage_type: self.api.as_ref().map(StorageType::from),
        }
    }

    pub fn serialized_tokens(&self) -> String {
        serialize_token_values(&self.tokens)
    }

    pub fn has_unsynced_changes(&self) -> bool {
        self.serialized_tokens() != self.last_synced_state
    }

    pub fn active_theme_object(&self) -> Option<&ThemeObject> {
        let active = self.active_theme.as_deref()?;
        self.themes
            .iter()
            .find(|theme| theme.id == active || theme.name == active)
    }

    /// Resolves with the active theme, else the used token sets, else every set.
    pub fn resolve(&self) -> ResolvedTokens {
        let merger = TokenSetMerger::new(&self.tokens);

        if let Some(theme) = self.active_theme_object() {
            return merger.merge_theme(theme);
        }

        if self.used_token_sets.is_empty() {
            return merger.merge_all();
        }

        merger.merge(&self.used_token_sets)
    }

    /// Resolves with the named theme (id or name), falling back to [`Self::resolve`].
    pub fn resolve_with_theme(&self, theme: Option<&str>) -> ResolvedTokens {
        let Some(wanted) = theme else {
            return self.resolve();
        };

        match self
            .themes
            .iter()
            .find(|candidate| candidate.id == wanted || candidate.name == wanted)
        {
            Some(found) => TokenSetMerger::new(&self.tokens).merge_theme(found),
            None => {
                warn!("Theme '{}' not found, resolving with current selection", wanted);
                self.resolve()
            }
        }
    }

    pub(crate) fn replace_token_data(&mut self, data: TokenData) {
        self.tokens = data.tokens;
        self.themes = data.themes;

        match data.used_token_sets {
            Some(used) => self.used_token_sets = used,
            None => {
                let tokens = &self.tokens;
                self.used_token_sets.retain(|name, _| tokens.contains_key(name));
                for name in tokens.keys() {
                    self.used_token_sets
                        .entry(name.clone())
                        .or_insert(TokenSetStatus::Enabled);
                }
            }
        }

        if data.active_theme.is_some() {
            self.active_theme = data.active_theme;
        }
        if data.updated_at.is_some() {
            self.updated_at = data.updated_at;
        }
    }
}
