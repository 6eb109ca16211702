//! Azure DevOps Git REST adapter.
//!
//! `base_url` is the organisation URL (`https://dev.azure.com/<org>`) and
//! `id` is either `<project>/<repository>` or a repository named after its
//! project.

use super::files::{FileLayout, RemoteFile};
use super::http;
use super::{RemoteStorageAdapter, SaveRequest};
use crate::error::storage::StorageError;

use models::{RemoteTokenData, StorageProvider, SyncContext};

use std::collections::HashSet;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use url::Url;

const PROVIDER: StorageProvider = StorageProvider::Ado;
const API_VERSION: &str = "7.0";
const HEADS_PREFIX: &str = "refs/heads/";
const EMPTY_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

#[derive(Debug, Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemResponse {
    path: String,
    #[serde(default)]
    is_folder: bool,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitRef {
    name: String,
    object_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefUpdateResult {
    #[serde(default)]
    success: bool,
}

pub struct AdoAdapter {
    client: Client,
    organisation: Url,
    project: String,
    repo: String,
    branch: String,
    layout: FileLayout,
    token: String,
}

impl AdoAdapter {
    pub fn new(client: Client, context: &SyncContext, multi_file: bool) -> Result<Self, StorageError> {
        let id = context.id.trim().trim_matches('/');
        let (project, repo) = match id.split_once('/') {
            Some((project, repo)) => (project, repo),
            None => (id, id),
        };
        if project.is_empty() || repo.is_empty() {
            return Err(StorageError::missing_id(PROVIDER));
        }

        let Some(base) = context.base_url.as_deref().map(str::trim).filter(|b| !b.is_empty()) else {
            return Err(StorageError::invalid_url(
                "Azure DevOps needs the organisation URL as base url",
            ));
        };

        Ok(Self {
            client,
            organisation: http::api_base(Some(base), base)?,
            project: project.to_string(),
            repo: repo.to_string(),
            branch: context.branch_or_default().to_string(),
            layout: FileLayout::resolve(PROVIDER, context.file_path.as_deref(), multi_file)?,
            token: context.secret.expose().to_string(),
        })
    }

    fn repo_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut all = vec![
            self.project.as_str(),
            "_apis",
            "git",
            "repositories",
            self.repo.as_str(),
        ];
        all.extend_from_slice(segments);
        let url = http::endpoint(&self.organisation, &all)?;
        Ok(http::with_query(url, &[("api-version", API_VERSION)]))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.basic_auth("", Some(&self.token))
        }
    }

    fn version_query<'a>(&self, branch: &'a str) -> [(&'static str, &'a str); 2] {
        [
            ("versionDescriptor.version", branch),
            ("versionDescriptor.versionType", "branch"),
        ]
    }

    async fn read_file(&self, path: String) -> Result<Option<RemoteFile>, StorageError> {
        let url = self.repo_url(&["items"])?;
        let item_path = format!("/{path}");
        let mut query = vec![
            ("path", item_path.as_str()),
            ("includeContent", "true"),
            ("$format", "json"),
        ];
        query.extend(self.version_query(&self.branch));
        let url = http::with_query(url, &query);

        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        let item: ItemResponse = http::json(PROVIDER, response).await?;
        Ok(Some(RemoteFile::new(path, item.content.unwrap_or_default())))
    }

    /// Files under the layout's path on `branch` (no leading `/`).
    async fn list_files(&self, branch: &str) -> Result<Option<Vec<String>>, StorageError> {
        let url = self.repo_url(&["items"])?;
        let scope = format!("/{}", self.layout.path());
        let mut query = vec![("scopePath", scope.as_str()), ("recursionLevel", "full")];
        query.extend(self.version_query(branch));
        let url = http::with_query(url, &query);

        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        let items: ValueList<ItemResponse> = http::json(PROVIDER, response).await?;

        Ok(Some(
            items
                .value
                .into_iter()
                .filter(|item| !item.is_folder)
                .map(|item| item.path.trim_start_matches('/').to_string())
                .filter(|path| self.layout.owns(path))
                .collect(),
        ))
    }

    async fn refs(&self, filter: &str) -> Result<Vec<GitRef>, StorageError> {
        let url = self.repo_url(&["refs"])?;
        let url = http::with_query(url, &[("filter", filter)]);
        let response = http::send(PROVIDER, self.authorize(self.client.get(url))).await?;
        let refs: ValueList<GitRef> = http::json(PROVIDER, response).await?;
        Ok(refs.value)
    }

    async fn head(&self, branch: &str) -> Result<Option<String>, StorageError> {
        let wanted = format!("{HEADS_PREFIX}{branch}");
        let refs = self.refs(&format!("heads/{branch}")).await?;
        Ok(refs
            .into_iter()
            .find(|r| r.name == wanted)
            .map(|r| r.object_id))
    }
}

#[async_trait]
impl RemoteStorageAdapter for AdoAdapter {
    fn provider(&self) -> StorageProvider {
        PROVIDER
    }

    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError> {
        let files = match &self.layout {
            FileLayout::SingleFile(path) => self.read_file(path.clone()).await?.map(|file| vec![file]),
            FileLayout::Directory(_) => match self.list_files(&self.branch).await? {
                Some(paths) if !paths.is_empty() => {
                    let reads = paths.into_iter().map(|path| self.read_file(path));
                    Some(try_join_all(reads).await?.into_iter().flatten().collect())
                }
                _ => None,
            },
        };

        match files {
            Some(files) => {
                debug!(
                    "Read {} token files from Azure DevOps {}/{}",
                    files.len(),
                    self.project,
                    self.repo
                );
                Ok(Some(self.layout.decode(&files)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), StorageError> {
        let Some(old_object_id) = self.head(&request.branch).await? else {
            return Err(StorageError::branch_creation(PROVIDER, &request.branch));
        };

        let existing: HashSet<String> = match &self.layout {
            FileLayout::SingleFile(path) => self
                .list_files(&request.branch)
                .await?
                .unwrap_or_default()
                .into_iter()
                .filter(|found| found == path)
                .collect(),
            FileLayout::Directory(_) => self
                .list_files(&request.branch)
                .await?
                .unwrap_or_default()
                .into_iter()
                .collect(),
        };

        let files = self.layout.encode(&request.data)?;
        let mut changes: Vec<serde_json::Value> = files
            .iter()
            .map(|file| {
                let change_type = if existing.contains(&file.path) { "edit" } else { "add" };
                json!({
                    "changeType": change_type,
                    "item": { "path": format!("/{}", file.path) },
                    "newContent": { "content": file.content, "contentType": "rawtext" },
                })
            })
            .collect();

        for stale in existing
            .iter()
            .filter(|path| !files.iter().any(|file| &file.path == *path))
        {
            changes.push(json!({
                "changeType": "delete",
                "item": { "path": format!("/{stale}") },
            }));
        }

        let url = self.repo_url(&["pushes"])?;
        http::send(
            PROVIDER,
            self.authorize(self.client.post(url)).json(&json!({
                "refUpdates": [{
                    "name": format!("{HEADS_PREFIX}{}", request.branch),
                    "oldObjectId": old_object_id,
                }],
                "commits": [{
                    "comment": request.message,
                    "changes": changes,
                }],
            })),
        )
        .await?;

        info!(
            "Pushed {} file(s) to Azure DevOps {}/{}@{}",
            files.len(),
            self.project,
            self.repo,
            request.branch
        );
        Ok(())
    }

    async fn fetch_branches(&self) -> Result<Option<Vec<String>>, StorageError> {
        let names: Vec<String> = self
            .refs("heads/")
            .await?
            .into_iter()
            .filter_map(|r| r.name.strip_prefix(HEADS_PREFIX).map(str::to_string))
            .collect();
        Ok((!names.is_empty()).then_some(names))
    }

    async fn create_branch(&self, name: &str, from: &str) -> Result<bool, StorageError> {
        let Some(source) = self.head(from).await? else {
            return Ok(false);
        };

        let url = self.repo_url(&["refs"])?;
        let response = http::send(
            PROVIDER,
            self.authorize(self.client.post(url)).json(&json!([{
                "name": format!("{HEADS_PREFIX}{name}"),
                "oldObjectId": EMPTY_OBJECT_ID,
                "newObjectId": source,
            }])),
        )
        .await?;
        let results: ValueList<RefUpdateResult> = http::json(PROVIDER, response).await?;

        Ok(!results.value.is_empty() && results.value.iter().all(|r| r.success))
    }

    async fn can_write(&self) -> Result<bool, StorageError> {
        self.refs("heads/").await?;
        Ok(true)
    }

    fn create_pull_request_url(&self, branch: &str) -> Option<String> {
        let mut url = http::endpoint(
            &self.organisation,
            &[self.project.as_str(), "_git", self.repo.as_str(), "pullrequestcreate"],
        )
        .ok()?;
        url.query_pairs_mut()
            .append_pair("sourceRef", branch);
        Some(url.to_string())
    }
}
