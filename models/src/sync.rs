use crate::{ThemeObject, TokenSets};

use common::RedactedSecret;
use serde::{Deserialize, Serialize};

/// Backend a token document is synchronised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Local,
    Url,
    #[serde(rename = "jsonbin")]
    JsonBin,
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
    Bitbucket,
    Ado,
}

impl StorageProvider {
    /// Git-hosted providers have branches and support multi-file layouts.
    pub fn is_git(&self) -> bool {
        matches!(
            self,
            StorageProvider::GitHub
                | StorageProvider::GitLab
                | StorageProvider::Bitbucket
                | StorageProvider::Ado
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StorageProvider::Local => "Local",
            StorageProvider::Url => "URL",
            StorageProvider::JsonBin => "JSONBin",
            StorageProvider::GitHub => "GitHub",
            StorageProvider::GitLab => "GitLab",
            StorageProvider::Bitbucket => "Bitbucket",
            StorageProvider::Ado => "Azure DevOps",
        }
    }

    /// Canonical error code reported when the provider rejects the secret.
    pub fn credential_error_code(&self) -> &'static str {
        match self {
            StorageProvider::GitHub => "GITHUB_CREDENTIAL_ERROR",
            StorageProvider::GitLab => "GITLAB_CREDENTIAL_ERROR",
            StorageProvider::Bitbucket => "BITBUCKET_CREDENTIAL_ERROR",
            StorageProvider::Ado => "ADO_CREDENTIAL_ERROR",
            StorageProvider::JsonBin => "JSONBIN_CREDENTIAL_ERROR",
            StorageProvider::Url => "URL_CREDENTIAL_ERROR",
            StorageProvider::Local => "GENERAL_CONNECTION_ERROR",
        }
    }
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One remote location plus the secret needed to reach it.
///
/// Not `Serialize`: persisting a context goes through
/// [`crate::StorageType`], which has no secret.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncContext {
    pub provider: StorageProvider,
    /// Repository (`owner/repo`), bin id or URL depending on the provider.
    pub id: String,
    pub name: String,
    pub branch: Option<String>,
    pub file_path: Option<String>,
    pub base_url: Option<String>,
    pub secret: RedactedSecret,
    pub internal_id: Option<String>,
}

impl SyncContext {
    pub fn new(provider: StorageProvider, id: impl Into<String>) -> Self {
        Self {
            provider,
            id: id.into(),
            name: String::new(),
            branch: None,
            file_path: None,
            base_url: None,
            secret: RedactedSecret::default(),
            internal_id: None,
        }
    }

    pub fn local() -> Self {
        Self::new(StorageProvider::Local, "")
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_secret(mut self, secret: impl Into<RedactedSecret>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn with_internal_id(mut self, internal_id: impl Into<String>) -> Self {
        self.internal_id = Some(internal_id.into());
        self
    }

    pub fn is_local(&self) -> bool {
        self.provider == StorageProvider::Local
    }

    pub fn branch_or_default(&self) -> &str {
        self.branch.as_deref().unwrap_or("main")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_set_order: Vec<String>,
}

/// Everything a successful `retrieve` produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteTokenData {
    pub tokens: TokenSets,
    pub themes: Vec<ThemeObject>,
    pub metadata: RemoteMetadata,
    pub updated_at: Option<String>,
}

impl RemoteTokenData {
    pub fn new(tokens: TokenSets) -> Self {
        Self {
            tokens,
            ..Default::default()
        }
    }

    pub fn with_themes(mut self, themes: Vec<ThemeObject>) -> Self {
        self.themes = themes;
        self
    }

    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    pub fn has_tokens(&self) -> bool {
        !self.tokens.is_empty()
    }
}

/// Outcome of fetching remote content, as reported to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncResult {
    Success(RemoteTokenData),
    Failure { error_message: String },
}

impl SyncResult {
    pub fn failure(error_message: impl Into<String>) -> Self {
        SyncResult::Failure {
            error_message: error_message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncResult::Success(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SyncResult::Success(_) => None,
            SyncResult::Failure { error_message } => Some(error_message),
        }
    }
}
