use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a theme uses one token set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSetStatus {
    Enabled,
    Disabled,
    /// Contributes values as a base layer but is not itself part of the output.
    Source,
}

/// Selection of set statuses, in declared order.
pub type UsedTokenSets = IndexMap<String, TokenSetStatus>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub selected_token_sets: UsedTokenSets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl ThemeObject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            selected_token_sets: UsedTokenSets::new(),
            group: None,
        }
    }

    pub fn with_set(mut self, set: impl Into<String>, status: TokenSetStatus) -> Self {
        self.selected_token_sets.insert(set.into(), status);
        self
    }
}
