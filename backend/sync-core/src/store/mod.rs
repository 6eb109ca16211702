//! Token store using the actor pattern.
//!
//! Holds the current token sets, themes and sync bookkeeping for one
//! document.
//!
//! # Architecture
//!
//! - Commands are sent via an mpsc channel, each with a oneshot reply
//! - A dedicated task applies commands sequentially to a private copy of the
//!   state and publishes it by swapping the `Arc`
//! - Readers clone the current `Arc<TokenState>` and never observe a
//!   half-applied edit

mod state;

pub use state::{TokenData, TokenState, serialize_token_values};

use crate::error::edit::EditError;
use crate::graph::edit;

use models::{SyncContext, Token, TokenSetStatus, TokenType, UsedTokenSets};

use std::sync::Arc;
use std::time::SystemTime;

use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};

/// Commands that mutate the token store.
#[derive(Debug, Clone)]
pub enum StoreCommand {
    CreateToken {
        set: String,
        token: Token,
    },
    EditToken {
        set: String,
        token: Token,
        old_name: Option<String>,
    },
    DeleteToken {
        set: String,
        name: String,
    },
    DuplicateToken {
        set: String,
        name: String,
        new_name: Option<String>,
    },
    DeleteTokenGroup {
        set: String,
        path: String,
        token_type: Option<TokenType>,
    },
    RenameTokenGroup {
        set: String,
        path: String,
        old_name: String,
        new_name: String,
    },
    DuplicateTokenGroup {
        set: String,
        path: String,
        old_name: String,
    },
    /// Replace tokens and themes wholesale (pull, load).
    SetTokenData(Box<TokenData>),
    SetLastSyncedState(String),
    SetActiveTheme(Option<String>),
    SetUsedTokenSets(UsedTokenSets),
    SetEditProhibited(bool),
    SetApi(Option<SyncContext>),
}

impl StoreCommand {
    fn is_token_edit(&self) -> bool {
        matches!(
            self,
            StoreCommand::CreateToken { .. }
                | StoreCommand::EditToken { .. }
                | StoreCommand::DeleteToken { .. }
                | StoreCommand::DuplicateToken { .. }
                | StoreCommand::DeleteTokenGroup { .. }
                | StoreCommand::RenameTokenGroup { .. }
                | StoreCommand::DuplicateTokenGroup { .. }
        )
    }
}

struct Envelope {
    command: StoreCommand,
    reply: oneshot::Sender<Result<(), EditError>>,
}

/// Token store handle.
///
/// This type is `Clone`; all clones share the same actor and state.
#[derive(Clone)]
pub struct TokenStore {
    /// Channel to send mutation commands to the actor
    command_tx: Arc<Mutex<Option<mpsc::Sender<Envelope>>>>,

    /// Current published snapshot
    state: Arc<RwLock<Arc<TokenState>>>,

    /// Track if actor has been initialized
    actor_init: Arc<Mutex<bool>>,
}

impl TokenStore {
    /// The actor is lazily spawned on first mutation.
    pub fn new() -> Self {
        Self::with_state(TokenState::default())
    }

    pub fn with_state(state: TokenState) -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            state: Arc::new(RwLock::new(Arc::new(state))),
            actor_init: Arc::new(Mutex::new(false)),
        }
    }

    /// Current state. The returned snapshot never changes.
    pub async fn snapshot(&self) -> Arc<TokenState> {
        Arc::clone(&*self.state.read().await)
    }

    /// Send a command and wait until it has been applied.
    ///
    /// # Errors
    ///
    /// Returns the edit failure, or [`EditError::StoreUnavailable`] if the
    /// actor has died.
    pub async fn apply(&self, command: StoreCommand) -> Result<(), EditError> {
        self.ensure_actor().await;

        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let tx_guard = self.command_tx.lock().await;
            let tx = tx_guard
                .as_ref()
                .ok_or_else(|| EditError::store_unavailable("Store actor not initialized"))?;

            tx.send(Envelope {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|e| EditError::store_unavailable(format!("Store actor died: {}", e)))?;
        }

        reply_rx
            .await
            .map_err(|e| EditError::store_unavailable(format!("Store actor dropped reply: {}", e)))?
    }

    pub async fn create_token(&self, set: &str, token: Token) -> Result<(), EditError> {
        self.apply(StoreCommand::CreateToken {
            set: set.to_string(),
            token,
        })
        .await
    }

    pub async fn edit_token(
        &self,
        set: &str,
        token: Token,
        old_name: Option<&str>,
    ) -> Result<(), EditError> {
        self.apply(StoreCommand::EditToken {
            set: set.to_string(),
            token,
            old_name: old_name.map(str::to_string),
        })
        .await
    }

    pub async fn delete_token(&self, set: &str, name: &str) -> Result<(), EditError> {
        self.apply(StoreCommand::DeleteToken {
            set: set.to_string(),
            name: name.to_string(),
        })
        .await
    }

    pub async fn duplicate_token(
        &self,
        set: &str,
        name: &str,
        new_name: Option<&str>,
    ) -> Result<(), EditError> {
        self.apply(StoreCommand::DuplicateToken {
            set: set.to_string(),
            name: name.to_string(),
            new_name: new_name.map(str::to_string),
        })
        .await
    }

    pub async fn delete_token_group(
        &self,
        set: &str,
        path: &str,
        token_type: Option<TokenType>,
    ) -> Result<(), EditError> {
        self.apply(StoreCommand::DeleteTokenGroup {
            set: set.to_string(),
            path: path.to_string(),
            token_type,
        })
        .await
    }

    pub async fn rename_token_group(
        &self,
        set: &str,
        path: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), EditError> {
        self.apply(StoreCommand::RenameTokenGroup {
            set: set.to_string(),
            path: path.to_string(),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        })
        .await
    }

    pub async fn duplicate_token_group(
        &self,
        set: &str,
        path: &str,
        old_name: &str,
    ) -> Result<(), EditError> {
        self.apply(StoreCommand::DuplicateTokenGroup {
            set: set.to_string(),
            path: path.to_string(),
            old_name: old_name.to_string(),
        })
        .await
    }

    pub async fn set_token_data(&self, data: TokenData) -> Result<(), EditError> {
        self.apply(StoreCommand::SetTokenData(Box::new(data))).await
    }

    pub async fn set_last_synced_state(&self, serialized: String) -> Result<(), EditError> {
        self.apply(StoreCommand::SetLastSyncedState(serialized)).await
    }

    pub async fn set_active_theme(&self, theme: Option<String>) -> Result<(), EditError> {
        self.apply(StoreCommand::SetActiveTheme(theme)).await
    }

    pub async fn set_used_token_sets(&self, used: UsedTokenSets) -> Result<(), EditError> {
        self.apply(StoreCommand::SetUsedTokenSets(used)).await
    }

    pub async fn set_edit_prohibited(&self, prohibited: bool) -> Result<(), EditError> {
        self.apply(StoreCommand::SetEditProhibited(prohibited)).await
    }

    pub async fn set_api(&self, api: Option<SyncContext>) -> Result<(), EditError> {
        self.apply(StoreCommand::SetApi(api)).await
    }

    /// Ensure actor is spawned (called lazily from async context).
    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(100);
            let state_clone = Arc::clone(&self.state);

            // Store tx BEFORE spawning to avoid race
            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard);

            tokio::spawn(store_actor(rx, state_clone));
            *init_guard = true;
            info!("Token store actor spawned");
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The store actor task.
///
/// Applies commands one at a time to a copy of the current state and swaps
/// the copy in on success. A failed command leaves the published state as is.
async fn store_actor(mut command_rx: mpsc::Receiver<Envelope>, state: Arc<RwLock<Arc<TokenState>>>) {
    info!("Token store actor started");

    while let Some(Envelope { command, reply }) = command_rx.recv().await {
        let current = Arc::clone(&*state.read().await);
        let mut next = (*current).clone();

        let result = apply_command(&mut next, command);

        if result.is_ok() {
            *state.write().await = Arc::new(next);
        }

        if reply.send(result).is_err() {
            debug!("Store command caller went away before the reply");
        }
    }

    warn!("Token store actor stopped - all handles dropped");
}

fn apply_command(state: &mut TokenState, command: StoreCommand) -> Result<(), EditError> {
    if command.is_token_edit() {
        if state.edit_prohibited {
            return Err(EditError::prohibited());
        }
        state.updated_at = Some(humantime::format_rfc3339_seconds(SystemTime::now()).to_string());
    }

    match command {
        StoreCommand::CreateToken { set, token } => {
            edit::create_token(&mut state.tokens, &set, token)?;
            state.used_token_sets.entry(set).or_insert(TokenSetStatus::Enabled);
        }
        StoreCommand::EditToken {
            set,
            token,
            old_name,
        } => edit::edit_token(&mut state.tokens, &set, token, old_name.as_deref())?,
        StoreCommand::DeleteToken { set, name } => {
            edit::delete_token(&mut state.tokens, &set, &name)?;
        }
        StoreCommand::DuplicateToken {
            set,
            name,
            new_name,
        } => {
            edit::duplicate_token(&mut state.tokens, &set, &name, new_name.as_deref())?;
        }
        StoreCommand::DeleteTokenGroup {
            set,
            path,
            token_type,
        } => {
            let removed = edit::delete_token_group(&mut state.tokens, &set, &path, token_type)?;
            debug!("Deleted {} tokens under '{}' in '{}'", removed, path, set);
        }
        StoreCommand::RenameTokenGroup {
            set,
            path,
            old_name,
            new_name,
        } => {
            edit::rename_token_group(&mut state.tokens, &set, &path, &old_name, &new_name)?;
        }
        StoreCommand::DuplicateTokenGroup {
            set,
            path,
            old_name,
        } => {
            edit::duplicate_token_group(&mut state.tokens, &set, &path, &old_name)?;
        }
        StoreCommand::SetTokenData(data) => state.replace_token_data(*data),
        StoreCommand::SetLastSyncedState(serialized) => state.last_synced_state = serialized,
        StoreCommand::SetActiveTheme(theme) => state.active_theme = theme,
        StoreCommand::SetUsedTokenSets(used) => state.used_token_sets = used,
        StoreCommand::SetEditProhibited(prohibited) => state.edit_prohibited = prohibited,
        StoreCommand::SetApi(api) => {
            match &api {
                Some(context) => info!("Active storage set to {} ({})", context.provider, context.id),
                None => info!("Active storage cleared"),
            }
            state.api = api;
        }
    }

    Ok(())
}
