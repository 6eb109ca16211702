//! What the orchestrator needs from whoever drives it (plugin UI, CLI).

use models::{StorageProvider, SyncContext};

use async_trait::async_trait;

/// Answers from the push dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSettings {
    pub branch: String,
    pub commit_message: String,
}

#[async_trait]
pub trait SyncHost: Send + Sync {
    /// Asked when the remote differs from non-empty local tokens.
    /// `false` keeps local tokens and continues as a push.
    async fn confirm_pull(&self, provider: StorageProvider) -> bool;

    /// Branch and commit message for a git push. `None` cancels before any
    /// write.
    async fn push_dialog(&self, context: &SyncContext, branches: &[String]) -> Option<PushSettings>;

    async fn push_succeeded(&self, _branch: &str, _pull_request_url: Option<&str>) {}

    /// Closes an open push dialog after a failed write.
    async fn close_dialog(&self) {}

    /// Reports an outcome once. Errors carry the canonical error code.
    async fn notify(&self, message: &str, is_error: bool);
}
