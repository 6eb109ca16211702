//! JSONBin v3 adapter. One bin holds the whole document as its record.

use super::http;
use super::{RemoteStorageAdapter, SaveRequest};
use crate::error::storage::StorageError;
use crate::JSONBIN_API_URL;

use models::{
    DOCUMENT_VERSION, RemoteMetadata, RemoteTokenData, StorageProvider, SyncContext, ThemeObject,
    TokenSets,
};

use std::time::SystemTime;

use async_trait::async_trait;
use log::info;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

const PROVIDER: StorageProvider = StorageProvider::JsonBin;
const MASTER_KEY_HEADER: &str = "X-Master-Key";
const BIN_NAME_HEADER: &str = "X-Bin-Name";

/// Stored record. `values` is keyed by set name, each set a token list.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BinRecord {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<TokenSets>,
    #[serde(rename = "$themes", default)]
    pub themes: Vec<ThemeObject>,
    #[serde(rename = "$metadata", default)]
    pub metadata: RemoteMetadata,
}

impl BinRecord {
    fn from_data(data: &RemoteTokenData) -> Self {
        let updated_at = data
            .updated_at
            .clone()
            .unwrap_or_else(|| humantime::format_rfc3339_seconds(SystemTime::now()).to_string());

        Self {
            version: String::from(DOCUMENT_VERSION),
            updated_at: Some(updated_at),
            values: Some(data.tokens.clone()),
            themes: data.themes.clone(),
            metadata: RemoteMetadata {
                token_set_order: data.tokens.keys().cloned().collect(),
            },
        }
    }

    /// `None` when the record never held token values.
    pub(crate) fn into_data(self) -> Option<RemoteTokenData> {
        let tokens = self.values?;
        Some(RemoteTokenData {
            tokens,
            themes: self.themes,
            metadata: self.metadata,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    record: BinRecord,
}

#[derive(Debug, Deserialize)]
struct CreatedMetadata {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    metadata: CreatedMetadata,
}

pub struct JsonBinAdapter {
    client: Client,
    api: Url,
    bin_id: String,
    secret: String,
}

impl JsonBinAdapter {
    /// An empty id is allowed so that [`RemoteStorageAdapter::create_storage`]
    /// can provision the bin.
    pub fn new(client: Client, context: &SyncContext) -> Result<Self, StorageError> {
        Ok(Self {
            client,
            api: http::api_base(context.base_url.as_deref(), JSONBIN_API_URL)?,
            bin_id: context.id.trim().to_string(),
            secret: context.secret.expose().to_string(),
        })
    }

    fn bin_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        if self.bin_id.is_empty() {
            return Err(StorageError::missing_id(PROVIDER));
        }
        let mut all = vec!["b", self.bin_id.as_str()];
        all.extend_from_slice(segments);
        http::endpoint(&self.api, &all)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(MASTER_KEY_HEADER, &self.secret)
    }
}

#[async_trait]
impl RemoteStorageAdapter for JsonBinAdapter {
    fn provider(&self) -> StorageProvider {
        PROVIDER
    }

    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError> {
        let url = self.bin_url(&["latest"])?;
        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Err(StorageError::missing_id(PROVIDER));
        };
        let latest: LatestResponse = http::json(PROVIDER, response).await?;
        Ok(latest.record.into_data())
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), StorageError> {
        let url = self.bin_url(&[])?;
        http::send(
            PROVIDER,
            self.authorize(self.client.put(url))
                .json(&BinRecord::from_data(&request.data)),
        )
        .await?;

        info!("Saved {} token set(s) to JSONBin {}", request.data.tokens.len(), self.bin_id);
        Ok(())
    }

    async fn can_write(&self) -> Result<bool, StorageError> {
        let url = self.bin_url(&["latest"])?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| StorageError::from_reqwest(PROVIDER, &e))?;
        Ok(response.status().is_success())
    }

    async fn create_storage(&self, name: &str) -> Result<Option<String>, StorageError> {
        let url = http::endpoint(&self.api, &["b"])?;
        let response = http::send(
            PROVIDER,
            self.authorize(self.client.post(url))
                .header(BIN_NAME_HEADER, name)
                .json(&BinRecord {
                    version: String::from(DOCUMENT_VERSION),
                    ..BinRecord::default()
                }),
        )
        .await?;
        let created: CreateResponse = http::json(PROVIDER, response).await?;

        info!("Created JSONBin '{}' ({})", name, created.metadata.id);
        Ok(Some(created.metadata.id))
    }
}
