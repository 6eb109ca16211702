//! Typed request/response channel between a host UI and the sync core.
//!
//! The transport is a tokio mpsc queue with a oneshot reply per request, so
//! the core never depends on how a host actually passes messages. Requests
//! are served one at a time in arrival order.

use crate::error::channel::ChannelError;
use crate::store::TokenState;
use crate::sync::{
    DocumentStorage, PullOutcome, PushOutcome, RestoreOutcome, SyncOrchestrator, UpdatePayload,
};

use models::{ResolvedTokens, StorageType, SyncContext};

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub enum PluginRequest {
    /// Tokens, themes or selection changed in the UI.
    Update(Box<UpdatePayload>),
    Pull(SyncContext),
    Push(SyncContext),
    Restore(SyncContext),
    AddProvider(SyncContext),
    Resolve { theme: Option<String> },
    Snapshot,
}

impl PluginRequest {
    fn name(&self) -> &'static str {
        match self {
            PluginRequest::Update(_) => "update",
            PluginRequest::Pull(_) => "pull",
            PluginRequest::Push(_) => "push",
            PluginRequest::Restore(_) => "restore",
            PluginRequest::AddProvider(_) => "add_provider",
            PluginRequest::Resolve { .. } => "resolve",
            PluginRequest::Snapshot => "snapshot",
        }
    }
}

#[derive(Debug, Clone)]
pub enum PluginResponse {
    Resolved(ResolvedTokens),
    Pulled(PullOutcome),
    Pushed(PushOutcome),
    Restored(RestoreOutcome),
    ProviderAdded(StorageType),
    Snapshot(Arc<TokenState>),
    /// Carries the canonical error code.
    Failed { error_message: String },
}

struct PluginEnvelope {
    request: PluginRequest,
    reply: oneshot::Sender<PluginResponse>,
}

/// Cloneable sender side of the channel.
#[derive(Clone)]
pub struct PluginClient {
    tx: mpsc::Sender<PluginEnvelope>,
}

impl PluginClient {
    /// # Errors
    ///
    /// [`ChannelError::Send`] when the server has stopped,
    /// [`ChannelError::Closed`] when it dropped the request unanswered.
    pub async fn request(&self, request: PluginRequest) -> Result<PluginResponse, ChannelError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let name = request.name();

        self.tx
            .send(PluginEnvelope {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|e| ChannelError::send(format!("{name}: {e}")))?;

        reply_rx
            .await
            .map_err(|e| ChannelError::closed(format!("{name}: {e}")))
    }
}

/// Spawns the server task. It stops once every [`PluginClient`] is dropped.
pub fn start_plugin_channel(
    orchestrator: Arc<SyncOrchestrator>,
    storage: Arc<dyn DocumentStorage>,
) -> (PluginClient, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(serve(rx, orchestrator, storage));
    info!("Plugin channel started");
    (PluginClient { tx }, task)
}

async fn serve(
    mut rx: mpsc::Receiver<PluginEnvelope>,
    orchestrator: Arc<SyncOrchestrator>,
    storage: Arc<dyn DocumentStorage>,
) {
    while let Some(PluginEnvelope { request, reply }) = rx.recv().await {
        let name = request.name();
        debug!("Plugin request: {}", name);

        let response = handle_request(request, &orchestrator, storage.as_ref()).await;

        if reply.send(response).is_err() {
            warn!("Plugin request '{}' finished after its caller went away", name);
        }
    }

    info!("Plugin channel stopped - all clients dropped");
}

async fn handle_request(
    request: PluginRequest,
    orchestrator: &SyncOrchestrator,
    storage: &dyn DocumentStorage,
) -> PluginResponse {
    match request {
        PluginRequest::Update(payload) => {
            match orchestrator.update_tokens_on_sources(*payload, storage).await {
                Ok(resolved) => PluginResponse::Resolved(resolved),
                Err(e) => failed(e.error_message()),
            }
        }
        PluginRequest::Pull(context) => match orchestrator.pull(&context).await {
            Ok(outcome) => PluginResponse::Pulled(outcome),
            Err(e) => failed(e.error_message()),
        },
        PluginRequest::Push(context) => match orchestrator.push(&context).await {
            Ok(outcome) => PluginResponse::Pushed(outcome),
            Err(e) => failed(e.error_message()),
        },
        PluginRequest::Restore(context) => {
            PluginResponse::Restored(orchestrator.restore(&context).await)
        }
        PluginRequest::AddProvider(context) => match orchestrator.add_provider(context).await {
            Ok(context) => PluginResponse::ProviderAdded(StorageType::from(&context)),
            Err(e) => failed(e.error_message()),
        },
        PluginRequest::Resolve { theme } => {
            let snapshot = orchestrator.store().snapshot().await;
            PluginResponse::Resolved(snapshot.resolve_with_theme(theme.as_deref()))
        }
        PluginRequest::Snapshot => PluginResponse::Snapshot(orchestrator.store().snapshot().await),
    }
}

fn failed(error_message: String) -> PluginResponse {
    PluginResponse::Failed { error_message }
}
