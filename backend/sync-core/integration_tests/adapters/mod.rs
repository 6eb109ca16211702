//! HTTP adapters against a local wiremock server.

mod ado;
mod bitbucket;
mod github;
mod gitlab;
mod jsonbin;
mod url_storage;

use crate::helpers::sets_with;

use sync_core::storage::files::{encode_document, to_pretty};
use sync_core::storage::{AdapterFactory, AdapterOptions, DefaultAdapterFactory, RemoteStorageAdapter};

use models::{RemoteTokenData, StorageProvider, SyncContext};

use std::sync::Arc;

use serde_json::Value;
use wiremock::{MockServer, Request};

pub fn build(context: &SyncContext) -> Arc<dyn RemoteStorageAdapter> {
    DefaultAdapterFactory::new(AdapterOptions::default())
        .create(context)
        .expect("adapter builds")
}

pub fn build_multi_file(context: &SyncContext) -> Arc<dyn RemoteStorageAdapter> {
    DefaultAdapterFactory::new(AdapterOptions {
        multi_file: true,
        ..AdapterOptions::default()
    })
    .create(context)
    .expect("adapter builds")
}

pub fn git_context(provider: StorageProvider, server: &MockServer) -> SyncContext {
    SyncContext::new(provider, "acme/tokens")
        .with_base_url(server.uri())
        .with_secret("secret")
}

/// Single-file document holding `sets_with(4)`.
pub fn token_document() -> String {
    to_pretty(&encode_document(&RemoteTokenData::new(sets_with(4)))).expect("document encodes")
}

/// Requests the server saw with the given method, in arrival order.
pub async fn requests(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is on")
        .into_iter()
        .filter(|request| request.method.as_str() == verb)
        .collect()
}

pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("body is JSON")
}
