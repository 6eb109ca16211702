use crate::{StorageProvider, SyncContext, ThemeObject, TokenSets, UsedTokenSets};

use common::RedactedSecret;
use serde::{Deserialize, Serialize};

/// Current version written into every persisted document.
pub const DOCUMENT_VERSION: &str = "1";

/// Canonical persisted shape of a token document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub check_for_changes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_theme: Option<String>,
    #[serde(default)]
    pub used_token_sets: UsedTokenSets,
    #[serde(default)]
    pub themes: Vec<ThemeObject>,
    #[serde(default)]
    pub values: TokenSets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageType>,
}

fn default_version() -> String {
    String::from(DOCUMENT_VERSION)
}

impl TokenDocument {
    pub fn new(values: TokenSets) -> Self {
        Self {
            version: default_version(),
            values,
            ..Default::default()
        }
    }
}

/// Where a document is synced to, minus the secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageType {
    pub provider: StorageProvider,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
}

impl StorageType {
    /// Rebuilds a full context once the secret has been looked up.
    pub fn to_context(&self, secret: RedactedSecret) -> SyncContext {
        SyncContext {
            provider: self.provider,
            id: self.id.clone(),
            name: self.name.clone(),
            branch: self.branch.clone(),
            file_path: self.file_path.clone(),
            base_url: self.base_url.clone(),
            secret,
            internal_id: self.internal_id.clone(),
        }
    }
}

impl From<&SyncContext> for StorageType {
    fn from(context: &SyncContext) -> Self {
        Self {
            provider: context.provider,
            id: context.id.clone(),
            name: context.name.clone(),
            branch: context.branch.clone(),
            file_path: context.file_path.clone(),
            base_url: context.base_url.clone(),
            internal_id: context.internal_id.clone(),
        }
    }
}
