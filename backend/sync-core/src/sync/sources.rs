//! Host document persistence and the UI's "tokens changed" update.
//!
//! The host stores the document as independent string keys so that a quota
//! failure on one key (usually `values`) does not lose the others.

use super::{SyncOrchestrator, SyncPhase};
use crate::error::storage::StorageError;
use crate::error::sync::SyncError;
use crate::storage::SaveRequest;
use crate::storage::files::checked_token_set;
use crate::store::{TokenData, TokenState};

use models::{
    DOCUMENT_VERSION, RemoteMetadata, RemoteTokenData, ResolvedTokens, StorageProvider,
    StorageType, SyncContext, ThemeObject, Token, TokenDocument, TokenSets, UsedTokenSets,
};

use std::time::SystemTime;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod document_keys {
    pub const VERSION: &str = "version";
    pub const THEMES: &str = "themes";
    pub const VALUES: &str = "values";
    pub const USED_TOKEN_SET: &str = "usedTokenSet";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const ACTIVE_THEME: &str = "activeTheme";
    pub const CHECK_FOR_CHANGES: &str = "checkForChanges";
    pub const STORAGE_TYPE: &str = "storageType";

    pub const ALL: [&str; 8] = [
        VERSION,
        THEMES,
        VALUES,
        USED_TOKEN_SET,
        UPDATED_AT,
        ACTIVE_THEME,
        CHECK_FOR_CHANGES,
        STORAGE_TYPE,
    ];
}

/// Shared-data storage on the host document.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// What the UI sends after tokens, themes or sync settings changed.
#[derive(Debug, Clone, Default)]
pub struct UpdatePayload {
    /// `None` when only the selection changed.
    pub tokens: Option<TokenSets>,
    pub used_token_set: UsedTokenSets,
    pub themes: Vec<ThemeObject>,
    pub active_theme: Option<String>,
    pub updated_at: Option<String>,
    pub should_update_remote: bool,
    pub is_local: bool,
    pub edit_prohibited: bool,
    pub api: Option<SyncContext>,
    /// Remote `updatedAt` this edit was based on.
    pub last_updated_at: Option<String>,
    pub check_for_changes: bool,
}

fn write_key<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::host_document(key, e.to_string()))
}

/// Writes every document key separately. Returns the keys that failed.
pub async fn write_document(storage: &dyn DocumentStorage, document: &TokenDocument) -> Vec<String> {
    let encoded: [(&str, Result<String, StorageError>); 8] = [
        (document_keys::VERSION, write_key(document_keys::VERSION, &document.version)),
        (document_keys::THEMES, write_key(document_keys::THEMES, &document.themes)),
        (document_keys::VALUES, write_key(document_keys::VALUES, &document.values)),
        (
            document_keys::USED_TOKEN_SET,
            write_key(document_keys::USED_TOKEN_SET, &document.used_token_sets),
        ),
        (
            document_keys::UPDATED_AT,
            write_key(document_keys::UPDATED_AT, &document.updated_at),
        ),
        (
            document_keys::ACTIVE_THEME,
            write_key(document_keys::ACTIVE_THEME, &document.active_theme),
        ),
        (
            document_keys::CHECK_FOR_CHANGES,
            write_key(document_keys::CHECK_FOR_CHANGES, &document.check_for_changes),
        ),
        (
            document_keys::STORAGE_TYPE,
            write_key(document_keys::STORAGE_TYPE, &document.storage_type),
        ),
    ];

    let mut failed = Vec::new();
    for (key, value) in encoded {
        let result = match value {
            Ok(value) => storage.set(key, &value).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Failed to write document key '{}': {}", key, e);
            failed.push(key.to_string());
        }
    }

    failed
}

async fn read_key<T: DeserializeOwned + Default>(
    storage: &dyn DocumentStorage,
    key: &str,
) -> Result<T, StorageError> {
    match storage.get(key).await? {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
            .map_err(|e| StorageError::host_document(key, e.to_string())),
        _ => Ok(T::default()),
    }
}

/// Reads the document back. Missing keys take their defaults.
pub async fn load_document(storage: &dyn DocumentStorage) -> Result<TokenDocument, StorageError> {
    let version: String = read_key(storage, document_keys::VERSION).await?;
    Ok(TokenDocument {
        version: if version.is_empty() {
            String::from(DOCUMENT_VERSION)
        } else {
            version
        },
        updated_at: read_key(storage, document_keys::UPDATED_AT).await?,
        check_for_changes: read_key(storage, document_keys::CHECK_FOR_CHANGES).await?,
        active_theme: read_key(storage, document_keys::ACTIVE_THEME).await?,
        used_token_sets: read_key(storage, document_keys::USED_TOKEN_SET).await?,
        themes: read_key(storage, document_keys::THEMES).await?,
        values: read_key::<IndexMap<String, Vec<Token>>>(storage, document_keys::VALUES)
            .await?
            .into_iter()
            .map(|(set_name, tokens)| {
                let set = checked_token_set(&set_name, tokens);
                (set_name, set)
            })
            .collect(),
        storage_type: read_key::<Option<StorageType>>(storage, document_keys::STORAGE_TYPE).await?,
    })
}

/// `true` when `remote` is strictly newer than `local`. Unparsable or
/// missing timestamps never block a write.
fn remote_is_newer(remote: Option<&str>, local: Option<&str>) -> bool {
    let (Some(remote), Some(local)) = (remote, local) else {
        return false;
    };
    match (
        humantime::parse_rfc3339_weak(remote),
        humantime::parse_rfc3339_weak(local),
    ) {
        (Ok(remote), Ok(local)) => remote > local,
        _ => {
            debug!("Unparsable updatedAt ('{}' / '{}'), not comparing", remote, local);
            false
        }
    }
}

impl SyncOrchestrator {
    /// Applies a UI update: pushes to JSONBin when auto-update applies,
    /// persists the document keys, and returns the resolved tokens.
    ///
    /// Remote and per-key storage failures are reported and logged; they do
    /// not stop the local update.
    ///
    /// # Errors
    ///
    /// Only a dead token store.
    pub async fn update_tokens_on_sources(
        &self,
        payload: UpdatePayload,
        storage: &dyn DocumentStorage,
    ) -> Result<ResolvedTokens, SyncError> {
        let auto_update = payload.tokens.is_some()
            && !payload.is_local
            && payload.should_update_remote
            && self.settings.update_remote
            && !payload.edit_prohibited;

        if auto_update
            && let (Some(tokens), Some(api)) = (&payload.tokens, &payload.api)
            && api.provider == StorageProvider::JsonBin
            && let Err(e) = self.update_jsonbin(&payload, tokens, api).await
        {
            self.report(e, SyncPhase::PushError).await;
        }

        if let Some(tokens) = payload.tokens.clone() {
            self.store
                .set_token_data(TokenData {
                    tokens,
                    themes: payload.themes.clone(),
                    used_token_sets: Some(payload.used_token_set.clone()),
                    active_theme: None,
                    updated_at: payload.updated_at.clone(),
                })
                .await?;
        } else {
            self.store
                .set_used_token_sets(payload.used_token_set.clone())
                .await?;
        }
        self.store.set_active_theme(payload.active_theme.clone()).await?;
        self.store.set_edit_prohibited(payload.edit_prohibited).await?;
        if payload.api.is_some() {
            self.store.set_api(payload.api.clone()).await?;
        }

        let mut state: TokenState = (*self.store.snapshot().await).clone();
        state.check_for_changes = payload.check_for_changes;
        let failed = write_document(storage, &state.to_document()).await;
        if !failed.is_empty() {
            warn!("{} document key(s) not saved: {}", failed.len(), failed.join(", "));
        }

        Ok(state.resolve())
    }

    async fn update_jsonbin(
        &self,
        payload: &UpdatePayload,
        tokens: &TokenSets,
        api: &SyncContext,
    ) -> Result<(), SyncError> {
        let adapter = self.factory.create(api)?;

        let remote = adapter.retrieve().await?;
        let remote_updated_at = remote.as_ref().and_then(|r| r.updated_at.as_deref());
        if remote_is_newer(remote_updated_at, payload.last_updated_at.as_deref()) {
            return Err(StorageError::remote_newer(
                remote_updated_at.unwrap_or_default(),
                payload.last_updated_at.as_deref().unwrap_or_default(),
            )
            .into());
        }

        let updated_at = payload
            .updated_at
            .clone()
            .unwrap_or_else(|| humantime::format_rfc3339_seconds(SystemTime::now()).to_string());

        adapter
            .save(&SaveRequest {
                branch: api.branch_or_default().to_string(),
                data: RemoteTokenData {
                    tokens: tokens.clone(),
                    themes: payload.themes.clone(),
                    metadata: RemoteMetadata {
                        token_set_order: tokens.keys().cloned().collect(),
                    },
                    updated_at: Some(updated_at),
                },
                message: self.settings.default_commit_message.clone(),
            })
            .await?;

        info!("Updated JSONBin {} from local edit", api.id);
        Ok(())
    }
}
