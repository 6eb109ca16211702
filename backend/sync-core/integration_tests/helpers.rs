//! Test helpers for sync-core integration tests.
//!
//! - In-memory adapter, factory and host for orchestrator flows
//! - In-memory host document storage
//! - Token fixtures and contexts pointing at a wiremock server

use sync_core::error::storage::StorageError;
use sync_core::storage::{AdapterFactory, RemoteStorageAdapter, SaveRequest};
use sync_core::store::{TokenState, TokenStore};
use sync_core::sync::{
    DocumentStorage, PushSettings, SyncHost, SyncOrchestrator, SyncSettings,
};

use models::{
    RemoteTokenData, StorageProvider, SyncContext, Token, TokenDocument, TokenSet, TokenSets,
    TokenType,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

pub fn sets_with(value: i64) -> TokenSets {
    let mut sets = TokenSets::new();
    sets.insert(
        String::from("global"),
        TokenSet::from(vec![
            Token::new("sizing.xs", TokenType::Sizing, json!(value)),
            Token::new("sizing.sm", TokenType::Sizing, json!("$sizing.xs * 2")),
        ]),
    );
    sets
}

pub fn store_with(tokens: TokenSets) -> TokenStore {
    TokenStore::with_state(TokenState::from_document(TokenDocument::new(tokens)))
}

pub fn context(provider: StorageProvider) -> SyncContext {
    let id = match provider {
        StorageProvider::Url => "https://tokens.example.com/tokens.json",
        StorageProvider::JsonBin => "bin-1",
        _ => "acme/tokens",
    };
    SyncContext::new(provider, id)
        .with_name("Test storage")
        .with_secret("secret")
}

// ============================================
// MOCK ADAPTER
// ============================================

pub struct MockAdapter {
    provider: StorageProvider,
    remote: Mutex<Option<RemoteTokenData>>,
    branches: Option<Vec<String>>,
    retrieve_status: Option<u16>,
    save_status: Option<u16>,
    create_branch_result: bool,
    writable: bool,
    created_id: Option<String>,
    pub saves: Mutex<Vec<SaveRequest>>,
    pub created_branches: Mutex<Vec<(String, String)>>,
}

impl MockAdapter {
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            remote: Mutex::new(None),
            branches: provider.is_git().then(|| vec![String::from("main")]),
            retrieve_status: None,
            save_status: None,
            create_branch_result: true,
            writable: provider != StorageProvider::Url,
            created_id: None,
            saves: Mutex::new(Vec::new()),
            created_branches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_remote(self, remote: RemoteTokenData) -> Self {
        *self.remote.lock().expect("remote lock") = Some(remote);
        self
    }

    pub fn with_branches(mut self, branches: Option<Vec<String>>) -> Self {
        self.branches = branches;
        self
    }

    pub fn failing_retrieve(mut self, status: u16) -> Self {
        self.retrieve_status = Some(status);
        self
    }

    pub fn failing_save(mut self, status: u16) -> Self {
        self.save_status = Some(status);
        self
    }

    pub fn refusing_branches(mut self) -> Self {
        self.create_branch_result = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn creating(mut self, id: &str) -> Self {
        self.created_id = Some(id.to_string());
        self
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().expect("saves lock").len()
    }

    pub fn last_save(&self) -> Option<SaveRequest> {
        self.saves.lock().expect("saves lock").last().cloned()
    }
}

#[async_trait]
impl RemoteStorageAdapter for MockAdapter {
    fn provider(&self) -> StorageProvider {
        self.provider
    }

    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError> {
        if let Some(status) = self.retrieve_status {
            return Err(StorageError::from_status(self.provider, status, "mock retrieve"));
        }
        Ok(self.remote.lock().expect("remote lock").clone())
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), StorageError> {
        if self.provider == StorageProvider::Url {
            return Err(StorageError::read_only(self.provider));
        }
        if let Some(status) = self.save_status {
            return Err(StorageError::from_status(self.provider, status, "mock save"));
        }
        *self.remote.lock().expect("remote lock") = Some(request.data.clone());
        self.saves.lock().expect("saves lock").push(request.clone());
        Ok(())
    }

    async fn fetch_branches(&self) -> Result<Option<Vec<String>>, StorageError> {
        Ok(self.branches.clone())
    }

    async fn create_branch(&self, name: &str, from: &str) -> Result<bool, StorageError> {
        self.created_branches
            .lock()
            .expect("branches lock")
            .push((name.to_string(), from.to_string()));
        Ok(self.create_branch_result)
    }

    async fn can_write(&self) -> Result<bool, StorageError> {
        Ok(self.writable)
    }

    async fn create_storage(&self, _name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.created_id.clone())
    }

    fn create_pull_request_url(&self, branch: &str) -> Option<String> {
        self.provider
            .is_git()
            .then(|| format!("https://example.com/acme/tokens/compare/{branch}"))
    }
}

/// Hands out the same adapter for every context and records the contexts.
pub struct MockFactory {
    adapter: Arc<MockAdapter>,
    pub contexts: Mutex<Vec<SyncContext>>,
}

impl MockFactory {
    pub fn new(adapter: Arc<MockAdapter>) -> Self {
        Self {
            adapter,
            contexts: Mutex::new(Vec::new()),
        }
    }
}

impl AdapterFactory for MockFactory {
    fn create(&self, context: &SyncContext) -> Result<Arc<dyn RemoteStorageAdapter>, StorageError> {
        self.contexts
            .lock()
            .expect("contexts lock")
            .push(context.clone());
        Ok(Arc::clone(&self.adapter) as Arc<dyn RemoteStorageAdapter>)
    }
}

// ============================================
// MOCK HOST
// ============================================

pub struct MockHost {
    confirm: bool,
    dialog: Option<PushSettings>,
    pub confirmations: AtomicUsize,
    pub dialogs: AtomicUsize,
    pub closed_dialogs: AtomicUsize,
    pub notifications: Mutex<Vec<(String, bool)>>,
    pub successes: Mutex<Vec<(String, Option<String>)>>,
}

impl MockHost {
    /// Confirms pulls and answers the push dialog with `main`.
    pub fn new() -> Self {
        Self {
            confirm: true,
            dialog: Some(PushSettings {
                branch: String::from("main"),
                commit_message: String::from("Update from tests"),
            }),
            confirmations: AtomicUsize::new(0),
            dialogs: AtomicUsize::new(0),
            closed_dialogs: AtomicUsize::new(0),
            notifications: Mutex::new(Vec::new()),
            successes: Mutex::new(Vec::new()),
        }
    }

    pub fn declining(mut self) -> Self {
        self.confirm = false;
        self
    }

    pub fn pushing_to(mut self, branch: &str) -> Self {
        self.dialog = Some(PushSettings {
            branch: branch.to_string(),
            commit_message: String::from("Update from tests"),
        });
        self
    }

    pub fn cancelling(mut self) -> Self {
        self.dialog = None;
        self
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications
            .lock()
            .expect("notifications lock")
            .iter()
            .filter(|(_, is_error)| *is_error)
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.notifications
            .lock()
            .expect("notifications lock")
            .iter()
            .filter(|(_, is_error)| !*is_error)
            .map(|(message, _)| message.clone())
            .collect()
    }
}

#[async_trait]
impl SyncHost for MockHost {
    async fn confirm_pull(&self, _provider: StorageProvider) -> bool {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        self.confirm
    }

    async fn push_dialog(&self, _context: &SyncContext, _branches: &[String]) -> Option<PushSettings> {
        self.dialogs.fetch_add(1, Ordering::SeqCst);
        self.dialog.clone()
    }

    async fn push_succeeded(&self, branch: &str, pull_request_url: Option<&str>) {
        self.successes
            .lock()
            .expect("successes lock")
            .push((branch.to_string(), pull_request_url.map(str::to_string)));
    }

    async fn close_dialog(&self) {
        self.closed_dialogs.fetch_add(1, Ordering::SeqCst);
    }

    async fn notify(&self, message: &str, is_error: bool) {
        self.notifications
            .lock()
            .expect("notifications lock")
            .push((message.to_string(), is_error));
    }
}

pub struct Harness {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub adapter: Arc<MockAdapter>,
    pub factory: Arc<MockFactory>,
    pub host: Arc<MockHost>,
}

pub fn harness(store: TokenStore, adapter: MockAdapter, host: MockHost) -> Harness {
    let adapter = Arc::new(adapter);
    let factory = Arc::new(MockFactory::new(Arc::clone(&adapter)));
    let host = Arc::new(host);
    let orchestrator = Arc::new(SyncOrchestrator::new(
        store,
        Arc::clone(&factory) as Arc<dyn AdapterFactory>,
        Arc::clone(&host) as Arc<dyn SyncHost>,
        SyncSettings::default(),
    ));

    Harness {
        orchestrator,
        adapter,
        factory,
        host,
    }
}

// ============================================
// IN-MEMORY DOCUMENT STORAGE
// ============================================

#[derive(Default)]
pub struct MemoryDocument {
    pub keys: Mutex<HashMap<String, String>>,
    /// Keys whose writes fail, as a host quota error would.
    pub rejecting: Vec<String>,
}

impl MemoryDocument {
    pub fn rejecting(keys: &[&str]) -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            rejecting: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.keys.lock().expect("keys lock").get(key).cloned()
    }
}

#[async_trait]
impl DocumentStorage for MemoryDocument {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.rejecting.iter().any(|k| k == key) {
            return Err(StorageError::host_document(key, "quota exceeded"));
        }
        self.keys
            .lock()
            .expect("keys lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
