//! Read-only adapter for a JSON document served from a plain URL.
//!
//! The secret, when present, is a JSON object of extra request headers
//! (`{"Authorization": "Bearer ..."}`).

use super::files::decode_document;
use super::http;
use super::jsonbin::BinRecord;
use super::{RemoteStorageAdapter, SaveRequest};
use crate::error::storage::StorageError;

use models::{RemoteTokenData, StorageProvider, SyncContext};

use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

const PROVIDER: StorageProvider = StorageProvider::Url;
const VALUES_KEY: &str = "values";

pub struct UrlAdapter {
    client: Client,
    url: Url,
    headers: HeaderMap,
}

impl UrlAdapter {
    /// # Errors
    ///
    /// [`StorageError::MissingId`] for an empty URL, [`StorageError::InvalidUrl`]
    /// for an unparsable one, and a credential error when the secret is not a
    /// JSON object of string headers.
    pub fn new(client: Client, context: &SyncContext) -> Result<Self, StorageError> {
        let raw = context.id.trim();
        if raw.is_empty() {
            return Err(StorageError::missing_id(PROVIDER));
        }

        Ok(Self {
            client,
            url: Url::parse(raw)?,
            headers: parse_headers(context.secret.expose())?,
        })
    }
}

/// An empty secret means no extra headers.
pub fn parse_headers(secret: &str) -> Result<HeaderMap, StorageError> {
    let mut headers = HeaderMap::new();
    if secret.trim().is_empty() {
        return Ok(headers);
    }

    let parsed: IndexMap<String, String> = serde_json::from_str(secret)
        .map_err(|_| StorageError::from_status(PROVIDER, 401, "secret is not a JSON header object"))?;

    for (name, value) in parsed {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| StorageError::payload(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| StorageError::payload(format!("invalid value for header '{name}': {e}")))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Accepts either the stored-record shape (`values` keyed by set) or a
/// nested single-file document.
pub fn decode_payload(payload: Value) -> Result<Option<RemoteTokenData>, StorageError> {
    let Value::Object(entries) = &payload else {
        return Err(StorageError::payload("URL did not return a JSON object"));
    };
    if entries.is_empty() {
        return Ok(None);
    }
    if entries.contains_key(VALUES_KEY) {
        let record: BinRecord = serde_json::from_value(payload)?;
        return Ok(record.into_data());
    }
    Ok(Some(decode_document(&payload)?))
}

#[async_trait]
impl RemoteStorageAdapter for UrlAdapter {
    fn provider(&self) -> StorageProvider {
        PROVIDER
    }

    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError> {
        let request = self.client.get(self.url.clone()).headers(self.headers.clone());
        let response = http::send(PROVIDER, request).await?;
        let payload: Value = http::json(PROVIDER, response).await?;

        debug!("Fetched token document from {}", self.url);
        decode_payload(payload)
    }

    async fn save(&self, _request: &SaveRequest) -> Result<(), StorageError> {
        Err(StorageError::read_only(PROVIDER))
    }

    async fn can_write(&self) -> Result<bool, StorageError> {
        Ok(false)
    }
}
