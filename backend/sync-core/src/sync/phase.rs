use serde::Serialize;

/// Where the orchestrator is in a pull or push flow.
///
/// Terminal phases (`Applied`, `NoChange`, `PushedSuccess`, ...) stay
/// published until the next flow starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Pulling,
    Diffing,
    ConfirmPending,
    Applied,
    NoChange,
    Pushing,
    Dialog,
    PushedSuccess,
    PushedNothing,
    PushError,
}
