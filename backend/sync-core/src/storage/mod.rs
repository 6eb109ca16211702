//! Remote storage adapters.
//!
//! One adapter per provider, built once per [`SyncContext`] by an
//! [`AdapterFactory`]. The orchestrator only ever talks to the
//! [`RemoteStorageAdapter`] trait.

pub mod ado;
pub mod bitbucket;
pub mod files;
pub mod github;
pub mod gitlab;
pub mod http;
pub mod jsonbin;
pub mod url_storage;

use crate::error::storage::StorageError;

use models::{RemoteTokenData, StorageProvider, SyncContext};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What a push writes.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub branch: String,
    pub data: RemoteTokenData,
    pub message: String,
}

/// Capability contract every provider implements.
///
/// Adapters are bound to one context at construction, so no method takes it
/// again. Timeouts are the adapter's responsibility.
#[async_trait]
pub trait RemoteStorageAdapter: Send + Sync {
    fn provider(&self) -> StorageProvider;

    /// Current remote content. `Ok(None)` means reachable but empty.
    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError>;

    async fn save(&self, request: &SaveRequest) -> Result<(), StorageError>;

    /// Branch names, or `None` when the provider has no branches or the
    /// listing came back empty-handed.
    async fn fetch_branches(&self) -> Result<Option<Vec<String>>, StorageError> {
        Ok(None)
    }

    /// Creates `name` from `from`. `Ok(false)` when the provider refused.
    async fn create_branch(&self, _name: &str, _from: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn can_write(&self) -> Result<bool, StorageError>;

    /// Provisions new remote storage and returns its id, for providers that
    /// support it.
    async fn create_storage(&self, _name: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    /// Web URL that opens a pull request from `branch`.
    fn create_pull_request_url(&self, _branch: &str) -> Option<String> {
        None
    }
}

/// Builds the adapter for a context.
pub trait AdapterFactory: Send + Sync {
    fn create(&self, context: &SyncContext) -> Result<Arc<dyn RemoteStorageAdapter>, StorageError>;
}

#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Whether directory paths may be written as one file per set.
    pub multi_file: bool,
    pub request_timeout: Duration,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            multi_file: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Factory for the real HTTP adapters.
#[derive(Debug, Clone, Default)]
pub struct DefaultAdapterFactory {
    options: AdapterOptions,
}

impl DefaultAdapterFactory {
    pub fn new(options: AdapterOptions) -> Self {
        Self { options }
    }
}

impl AdapterFactory for DefaultAdapterFactory {
    fn create(&self, context: &SyncContext) -> Result<Arc<dyn RemoteStorageAdapter>, StorageError> {
        let client = http::build_client(self.options.request_timeout, context.provider)?;
        let multi_file = self.options.multi_file;

        let adapter: Arc<dyn RemoteStorageAdapter> = match context.provider {
            StorageProvider::GitHub => {
                Arc::new(github::GitHubAdapter::new(client, context, multi_file)?)
            }
            StorageProvider::GitLab => {
                Arc::new(gitlab::GitLabAdapter::new(client, context, multi_file)?)
            }
            StorageProvider::Bitbucket => {
                Arc::new(bitbucket::BitbucketAdapter::new(client, context, multi_file)?)
            }
            StorageProvider::Ado => Arc::new(ado::AdoAdapter::new(client, context, multi_file)?),
            StorageProvider::JsonBin => Arc::new(jsonbin::JsonBinAdapter::new(client, context)?),
            StorageProvider::Url => Arc::new(url_storage::UrlAdapter::new(client, context)?),
            StorageProvider::Local => return Err(StorageError::missing_id(StorageProvider::Local)),
        };

        Ok(adapter)
    }
}
