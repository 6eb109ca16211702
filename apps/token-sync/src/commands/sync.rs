use crate::document::FileDocumentStorage;
use crate::error::AppError;

use sync_core::config::{AppConfig, ProvidersConfig};
use sync_core::error::SyncError;
use sync_core::storage::AdapterFactory;
use sync_core::store::{TokenState, TokenStore};
use sync_core::sync::{
    PullOutcome, PushOutcome, RestoreOutcome, SyncHost, SyncOrchestrator, load_document,
    write_document,
};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Pull,
    Push,
    Restore,
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncKind::Pull => "pull",
            SyncKind::Push => "push",
            SyncKind::Restore => "restore",
        })
    }
}

/// What a sync command printed on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub provider: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,
}

impl SyncReport {
    fn new(provider: &str, outcome: &str) -> Self {
        Self {
            provider: provider.to_string(),
            outcome: outcome.to_string(),
            branch: None,
            pull_request_url: None,
        }
    }

    fn from_push(provider: &str, outcome: &PushOutcome) -> Self {
        match outcome {
            PushOutcome::Pushed {
                branch,
                pull_request_url,
            } => Self {
                branch: Some(branch.clone()),
                pull_request_url: pull_request_url.clone(),
                ..Self::new(provider, "pushed")
            },
            PushOutcome::NothingToCommit => Self::new(provider, "nothing-to-commit"),
            PushOutcome::Cancelled => Self::new(provider, "cancelled"),
        }
    }

    fn from_pull(provider: &str, outcome: &PullOutcome) -> Self {
        match outcome {
            PullOutcome::Applied => Self::new(provider, "applied"),
            PullOutcome::NothingToCommit => Self::new(provider, "nothing-to-commit"),
            PullOutcome::RemoteEmpty => Self::new(provider, "remote-empty"),
            PullOutcome::Declined { push: None } => Self::new(provider, "declined"),
            PullOutcome::Declined { push: Some(push) } => Self::from_push(provider, push),
        }
    }
}

/// Runs one sync flow against the document file and writes the result back.
///
/// # Errors
///
/// Unknown provider keys, missing secrets and unreadable documents fail
/// before any request. Sync failures carry their canonical code; local state
/// is not written in that case.
pub async fn run_sync(
    kind: SyncKind,
    provider_key: &str,
    document: &Path,
    config_dir: &Path,
    config: &AppConfig,
    host: Arc<dyn SyncHost>,
    factory: Arc<dyn AdapterFactory>,
) -> Result<SyncReport, AppError> {
    let providers = ProvidersConfig::load(config_dir)?;
    let entry = providers.find(provider_key)?;
    let context = entry.to_context()?;
    info!("Starting {} with {} '{}'", kind, entry.provider, entry.name);

    let storage = FileDocumentStorage::open(document).await?;
    let loaded = load_document(&storage).await?;
    let store = TokenStore::with_state(TokenState::from_document(loaded));
    store.set_api(Some(context.clone())).await.map_err(SyncError::from)?;

    let orchestrator = SyncOrchestrator::new(store, factory, host, config.sync_settings());

    let report = match kind {
        SyncKind::Pull => SyncReport::from_pull(&entry.name, &orchestrator.pull(&context).await?),
        SyncKind::Push => SyncReport::from_push(&entry.name, &orchestrator.push(&context).await?),
        SyncKind::Restore => match orchestrator.restore(&context).await {
            RestoreOutcome::Pulled(outcome) => SyncReport::from_pull(&entry.name, &outcome),
            RestoreOutcome::Seeded(outcome) => {
                let mut report = SyncReport::from_push(&entry.name, &outcome);
                report.outcome = format!("seeded-{}", report.outcome);
                report
            }
            RestoreOutcome::Unreachable { error_message } => {
                return Err(AppError::app(format!(
                    "{} is unreachable ({error_message}), local tokens kept",
                    entry.name
                )));
            }
        },
    };

    let state = orchestrator.store().snapshot().await;
    let failed = write_document(&storage, &state.to_document()).await;
    if !failed.is_empty() {
        return Err(AppError::document(
            storage.path(),
            format!("could not save {}", failed.join(", ")),
        ));
    }
    debug!("Document written to {}", storage.path().display());

    Ok(report)
}
