//! Pull, push and restore flows against one remote at a time.
//!
//! # Architecture
//!
//! - An [`AdapterFactory`] builds one adapter per [`SyncContext`]; nothing in
//!   here branches on the provider beyond "is it git" and "is it writable"
//! - Local state lives in the [`TokenStore`]; a flow only ever replaces it
//!   wholesale
//! - User decisions (confirm pull, push dialog) and notifications go through
//!   [`SyncHost`]
//! - Network failures are reported once and never retried

mod host;
mod phase;
mod sources;

pub use host::{PushSettings, SyncHost};
pub use phase::SyncPhase;
pub use sources::{
    DocumentStorage, UpdatePayload, document_keys, load_document, write_document,
};

use crate::error::storage::StorageError;
use crate::error::sync::SyncError;
use crate::storage::{AdapterFactory, RemoteStorageAdapter, SaveRequest};
use crate::store::{TokenData, TokenStore, serialize_token_values};

use models::{RemoteMetadata, RemoteTokenData, StorageProvider, SyncContext, SyncResult};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use tokio::sync::watch;

pub const DEFAULT_COMMIT_MESSAGE: &str = "Update tokens";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Whether local edits are pushed automatically to providers that
    /// support it (JSONBin).
    pub update_remote: bool,
    pub default_commit_message: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            update_remote: true,
            default_commit_message: String::from(DEFAULT_COMMIT_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullOutcome {
    /// Remote tokens replaced local state.
    Applied,
    /// Remote and local token values are identical.
    NothingToCommit,
    /// The user kept local tokens. `push` is the result of the fall-through
    /// push, absent for read-only providers.
    Declined { push: Option<PushOutcome> },
    /// Reachable, but holds no tokens.
    RemoteEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed {
        branch: String,
        pull_request_url: Option<String>,
    },
    NothingToCommit,
    /// The push dialog was dismissed before any write.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    Pulled(PullOutcome),
    /// The remote was empty and has been seeded from local tokens.
    Seeded(PushOutcome),
    /// Local state is untouched; the error was already reported.
    Unreachable { error_message: String },
}

/// Marks a flow as in flight for its lifetime.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct SyncOrchestrator {
    store: TokenStore,
    factory: Arc<dyn AdapterFactory>,
    host: Arc<dyn SyncHost>,
    settings: SyncSettings,
    phase: watch::Sender<SyncPhase>,
    in_flight: AtomicBool,
}

impl SyncOrchestrator {
    pub fn new(
        store: TokenStore,
        factory: Arc<dyn AdapterFactory>,
        host: Arc<dyn SyncHost>,
        settings: SyncSettings,
    ) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            store,
            factory,
            host,
            settings,
            phase,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Receives every phase change.
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: SyncPhase) {
        debug!("Sync phase: {:?}", phase);
        self.phase.send_replace(phase);
    }

    /// Overlapping flows are not queued; the later one simply wins.
    fn begin(&self, flow: &str) -> FlightGuard<'_> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Starting {} while another sync flow is in flight", flow);
        }
        FlightGuard {
            flag: &self.in_flight,
        }
    }

    async fn report(&self, error: SyncError, phase: SyncPhase) -> SyncError {
        warn!("Sync failed: {}", error);
        self.set_phase(phase);
        self.host.notify(&error.error_message(), true).await;
        error
    }

    fn adapter(&self, context: &SyncContext) -> Result<Arc<dyn RemoteStorageAdapter>, StorageError> {
        self.factory.create(context)
    }

    /// Fetches remote content without touching local state.
    pub async fn retrieve(&self, context: &SyncContext) -> SyncResult {
        let result = match self.adapter(context) {
            Ok(adapter) => adapter.retrieve().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => SyncResult::Success(data.unwrap_or_default()),
            Err(e) => {
                warn!("Retrieve from {} failed: {}", context.provider, e);
                SyncResult::failure(e.error_message())
            }
        }
    }

    /// # Errors
    ///
    /// Adapter failures, reported once through [`SyncHost::notify`]. Local
    /// state is left as it was.
    pub async fn pull(&self, context: &SyncContext) -> Result<PullOutcome, SyncError> {
        let _flight = self.begin("pull");
        self.pull_flow(context).await
    }

    async fn pull_flow(&self, context: &SyncContext) -> Result<PullOutcome, SyncError> {
        self.set_phase(SyncPhase::Pulling);

        let adapter = match self.adapter(context) {
            Ok(adapter) => adapter,
            Err(e) => return Err(self.report(e.into(), SyncPhase::Idle).await),
        };

        let remote = match adapter.retrieve().await {
            Ok(remote) => remote.filter(RemoteTokenData::has_tokens),
            Err(e) => return Err(self.report(e.into(), SyncPhase::Idle).await),
        };

        let Some(remote) = remote else {
            info!("{} holds no tokens", context.provider);
            self.set_phase(SyncPhase::Idle);
            return Ok(PullOutcome::RemoteEmpty);
        };

        self.set_phase(SyncPhase::Diffing);
        let local = self.store.snapshot().await;
        let remote_serialized = serialize_token_values(&remote.tokens);

        if local.tokens.is_empty() {
            self.apply_remote(context, remote, remote_serialized).await?;
            return Ok(PullOutcome::Applied);
        }

        if remote_serialized == local.serialized_tokens() {
            self.store.set_last_synced_state(remote_serialized).await?;
            self.store.set_api(Some(context.clone())).await?;
            self.set_phase(SyncPhase::NoChange);
            self.host.notify("Nothing to commit", false).await;
            return Ok(PullOutcome::NothingToCommit);
        }

        self.set_phase(SyncPhase::ConfirmPending);
        if self.host.confirm_pull(context.provider).await {
            self.apply_remote(context, remote, remote_serialized).await?;
            return Ok(PullOutcome::Applied);
        }

        info!("Remote changes declined, keeping local tokens");
        if context.provider == StorageProvider::Url {
            self.set_phase(SyncPhase::Idle);
            return Ok(PullOutcome::Declined { push: None });
        }

        let push = self.push_flow(adapter.as_ref(), context, Some(remote)).await?;
        Ok(PullOutcome::Declined { push: Some(push) })
    }

    async fn apply_remote(
        &self,
        context: &SyncContext,
        remote: RemoteTokenData,
        serialized: String,
    ) -> Result<(), SyncError> {
        info!(
            "Applying {} token set(s) from {}",
            remote.tokens.len(),
            context.provider
        );
        self.store.set_token_data(TokenData::from(remote)).await?;
        self.store.set_last_synced_state(serialized).await?;
        self.store.set_api(Some(context.clone())).await?;
        self.set_phase(SyncPhase::Applied);
        Ok(())
    }

    /// # Errors
    ///
    /// [`SyncError::EmptyBranch`] when a git provider lists no branches (no
    /// write is attempted), or the adapter failure. Errors after the dialog
    /// was shown close it first.
    pub async fn push(&self, context: &SyncContext) -> Result<PushOutcome, SyncError> {
        let _flight = self.begin("push");

        let adapter = match self.adapter(context) {
            Ok(adapter) => adapter,
            Err(e) => return Err(self.report(e.into(), SyncPhase::PushError).await),
        };

        self.push_flow(adapter.as_ref(), context, None).await
    }

    /// `known_remote` skips the retrieve when the caller already has it.
    async fn push_flow(
        &self,
        adapter: &dyn RemoteStorageAdapter,
        context: &SyncContext,
        known_remote: Option<RemoteTokenData>,
    ) -> Result<PushOutcome, SyncError> {
        self.set_phase(SyncPhase::Pushing);
        let is_git = context.provider.is_git();

        let branches = if is_git {
            match adapter.fetch_branches().await {
                Ok(Some(branches)) if !branches.is_empty() => branches,
                Ok(_) => {
                    let error = SyncError::empty_branch(context.provider);
                    return Err(self.report(error, SyncPhase::PushError).await);
                }
                Err(e) => return Err(self.report(e.into(), SyncPhase::PushError).await),
            }
        } else {
            Vec::new()
        };

        let local = self.store.snapshot().await;
        let local_serialized = local.serialized_tokens();

        let remote = match known_remote {
            Some(remote) => Some(remote),
            None => match adapter.retrieve().await {
                Ok(remote) => remote,
                Err(e) => return Err(self.report(e.into(), SyncPhase::PushError).await),
            },
        };

        if remote.is_some_and(|r| serialize_token_values(&r.tokens) == local_serialized) {
            self.store.set_last_synced_state(local_serialized).await?;
            self.set_phase(SyncPhase::PushedNothing);
            self.host.notify("Nothing to commit", false).await;
            return Ok(PushOutcome::NothingToCommit);
        }

        let settings = if is_git {
            self.set_phase(SyncPhase::Dialog);
            match self.host.push_dialog(context, &branches).await {
                Some(settings) => settings,
                None => {
                    info!("Push cancelled");
                    self.set_phase(SyncPhase::Idle);
                    return Ok(PushOutcome::Cancelled);
                }
            }
        } else {
            PushSettings {
                branch: context.branch_or_default().to_string(),
                commit_message: self.settings.default_commit_message.clone(),
            }
        };
        self.set_phase(SyncPhase::Pushing);

        if is_git && !branches.contains(&settings.branch) {
            let from = base_branch(context, &branches);
            info!("Creating branch '{}' from '{}'", settings.branch, from);
            match adapter.create_branch(&settings.branch, from).await {
                Ok(true) => {}
                Ok(false) => {
                    self.host.close_dialog().await;
                    let error = StorageError::branch_creation(context.provider, &settings.branch);
                    return Err(self.report(error.into(), SyncPhase::PushError).await);
                }
                Err(e) => {
                    self.host.close_dialog().await;
                    return Err(self.report(e.into(), SyncPhase::PushError).await);
                }
            }
        }

        let request = SaveRequest {
            branch: settings.branch.clone(),
            data: RemoteTokenData {
                tokens: local.tokens.clone(),
                themes: local.themes.clone(),
                metadata: RemoteMetadata {
                    token_set_order: local.tokens.keys().cloned().collect(),
                },
                updated_at: local.updated_at.clone(),
            },
            message: settings.commit_message,
        };

        if let Err(e) = adapter.save(&request).await {
            self.host.close_dialog().await;
            return Err(self.report(e.into(), SyncPhase::PushError).await);
        }

        let pull_request_url = if is_git {
            adapter.create_pull_request_url(&settings.branch)
        } else {
            None
        };

        self.store.set_last_synced_state(local_serialized).await?;
        self.store
            .set_api(Some(context.clone().with_branch(settings.branch.clone())))
            .await?;
        self.set_phase(SyncPhase::PushedSuccess);
        self.host
            .push_succeeded(&settings.branch, pull_request_url.as_deref())
            .await;
        info!("Pushed tokens to {} ({})", context.provider, settings.branch);

        Ok(PushOutcome::Pushed {
            branch: settings.branch,
            pull_request_url,
        })
    }

    /// Startup sync with stored credentials. Never fails: an unreachable
    /// remote leaves local state as it was.
    pub async fn restore(&self, context: &SyncContext) -> RestoreOutcome {
        match self.restore_flow(context).await {
            Ok(outcome) => outcome,
            Err(e) => RestoreOutcome::Unreachable {
                error_message: e.error_message(),
            },
        }
    }

    async fn restore_flow(&self, context: &SyncContext) -> Result<RestoreOutcome, SyncError> {
        let _flight = self.begin("restore");

        let adapter = match self.adapter(context) {
            Ok(adapter) => adapter,
            Err(e) => return Err(self.report(e.into(), SyncPhase::Idle).await),
        };

        // A repository without branches cannot be read from or written to.
        if context.provider.is_git() {
            match adapter.fetch_branches().await {
                Ok(Some(branches)) if !branches.is_empty() => {}
                Ok(_) => {
                    let error = SyncError::empty_branch(context.provider);
                    return Err(self.report(error, SyncPhase::Idle).await);
                }
                Err(e) => return Err(self.report(e.into(), SyncPhase::Idle).await),
            }
        }

        let pulled = self.pull_flow(context).await?;
        let seed = pulled == PullOutcome::RemoteEmpty
            && context.provider != StorageProvider::Url
            && !self.store.snapshot().await.tokens.is_empty();

        let outcome = if seed {
            info!("{} is empty, seeding it from local tokens", context.provider);
            let push = self.push_flow(adapter.as_ref(), context, None).await?;
            RestoreOutcome::Seeded(push)
        } else {
            RestoreOutcome::Pulled(pulled)
        };

        if context.provider.is_git() {
            self.apply_access(adapter.as_ref(), context).await?;
        }

        Ok(outcome)
    }

    /// Locks local editing when the credentials cannot write to the remote.
    async fn apply_access(
        &self,
        adapter: &dyn RemoteStorageAdapter,
        context: &SyncContext,
    ) -> Result<(), SyncError> {
        match adapter.can_write().await {
            Ok(writable) => {
                if !writable {
                    info!("{} is read-only, local edits are locked", context.provider);
                }
                self.store.set_edit_prohibited(!writable).await?;
            }
            Err(e) => warn!("Could not read permissions on {}: {}", context.provider, e),
        }
        Ok(())
    }

    /// Connects a new storage entry and makes it the active one.
    ///
    /// Returns the context as stored, with the id filled in when a JSONBin
    /// was created.
    ///
    /// # Errors
    ///
    /// [`SyncError::MissingCredentials`] for an incomplete JSONBin or URL
    /// entry, [`SyncError::NoTokens`] when a URL yields no tokens,
    /// [`SyncError::EmptyBranch`] for a git repository without branches, or
    /// the underlying sync failure.
    pub async fn add_provider(&self, context: SyncContext) -> Result<SyncContext, SyncError> {
        let context = match context.provider {
            StorageProvider::JsonBin => self.add_jsonbin(context).await?,
            StorageProvider::Url => {
                if context.id.trim().is_empty() {
                    let error = SyncError::missing_credentials(context.provider);
                    return Err(self.report(error, SyncPhase::Idle).await);
                }
                let _flight = self.begin("add provider");
                if self.pull_flow(&context).await? == PullOutcome::RemoteEmpty {
                    let error = SyncError::no_tokens(context.provider);
                    return Err(self.report(error, SyncPhase::Idle).await);
                }
                context
            }
            StorageProvider::Local => {
                self.store.set_api(None).await?;
                return Ok(context);
            }
            _ => {
                self.restore_flow(&context).await?;
                context
            }
        };

        self.store.set_api(Some(context.clone())).await?;
        info!("Storage '{}' ({}) added", context.name, context.provider);
        Ok(context)
    }

    async fn add_jsonbin(&self, mut context: SyncContext) -> Result<SyncContext, SyncError> {
        if context.secret.is_empty() {
            let error = SyncError::missing_credentials(context.provider);
            return Err(self.report(error, SyncPhase::Idle).await);
        }

        if !context.id.trim().is_empty() {
            self.restore_flow(&context).await?;
            return Ok(context);
        }

        let _flight = self.begin("create bin");
        let created = match self.adapter(&context) {
            Ok(adapter) => adapter.create_storage(&context.name).await,
            Err(e) => Err(e),
        };
        let id = match created {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = SyncError::missing_credentials(context.provider);
                return Err(self.report(error, SyncPhase::Idle).await);
            }
            Err(e) => return Err(self.report(e.into(), SyncPhase::Idle).await),
        };
        context.id = id;

        let adapter = match self.adapter(&context) {
            Ok(adapter) => adapter,
            Err(e) => return Err(self.report(e.into(), SyncPhase::PushError).await),
        };
        let push = self.push_flow(adapter.as_ref(), &context, None).await?;
        debug!("Seeded new bin {}: {:?}", context.id, push);

        Ok(context)
    }
}

/// Branch a new branch is cut from: the configured one if it exists,
/// otherwise whatever the provider listed first.
fn base_branch<'a>(context: &'a SyncContext, branches: &'a [String]) -> &'a str {
    let configured = context.branch_or_default();
    if branches.iter().any(|b| b == configured) {
        configured
    } else {
        branches.first().map(String::as_str).unwrap_or(configured)
    }
}
