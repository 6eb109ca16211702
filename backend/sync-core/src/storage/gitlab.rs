//! GitLab REST v4 adapter.
//!
//! Project ids and file paths are sent as single percent-encoded path
//! segments (`group%2Fproject`, `tokens%2Fglobal.json`).

use super::files::{FileLayout, RemoteFile};
use super::http;
use super::{RemoteStorageAdapter, SaveRequest};
use crate::error::storage::StorageError;
use crate::GITLAB_WEB_URL;

use models::{RemoteTokenData, StorageProvider, SyncContext};

use std::collections::HashSet;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use url::Url;

const PROVIDER: StorageProvider = StorageProvider::GitLab;
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const API_SUFFIX: &str = "/api/v4";
const PAGE_SIZE: &str = "100";
/// GitLab "Developer" role, the lowest that may push.
const DEVELOPER_ACCESS: u32 = 30;

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AccessLevel {
    access_level: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectPermissions {
    project_access: Option<AccessLevel>,
    group_access: Option<AccessLevel>,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    #[serde(default)]
    permissions: ProjectPermissions,
}

pub struct GitLabAdapter {
    client: Client,
    api: Url,
    web: String,
    project: String,
    branch: String,
    layout: FileLayout,
    token: String,
}

impl GitLabAdapter {
    pub fn new(client: Client, context: &SyncContext, multi_file: bool) -> Result<Self, StorageError> {
        let project = context.id.trim().trim_matches('/');
        if project.is_empty() {
            return Err(StorageError::missing_id(PROVIDER));
        }

        let web = context
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(|b| b.trim_end_matches('/').trim_end_matches(API_SUFFIX).to_string())
            .unwrap_or_else(|| GITLAB_WEB_URL.to_string());
        let api = Url::parse(&format!("{web}{API_SUFFIX}"))?;

        Ok(Self {
            client,
            api,
            web,
            project: project.to_string(),
            branch: context.branch_or_default().to_string(),
            layout: FileLayout::resolve(PROVIDER, context.file_path.as_deref(), multi_file)?,
            token: context.secret.expose().to_string(),
        })
    }

    fn project_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut all = vec!["projects", self.project.as_str()];
        all.extend_from_slice(segments);
        http::endpoint(&self.api, &all)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header(TOKEN_HEADER, &self.token)
        }
    }

    async fn raw_file(&self, path: String, branch: &str) -> Result<Option<RemoteFile>, StorageError> {
        let url = self.project_url(&["repository", "files", &path, "raw"])?;
        let url = http::with_query(url, &[("ref", branch)]);
        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        let content = http::text(PROVIDER, response).await?;
        Ok(Some(RemoteFile::new(path, content)))
    }

    /// Blob paths under the layout's directory, `None` when the branch or
    /// directory does not exist.
    async fn tree(&self, branch: &str) -> Result<Option<Vec<String>>, StorageError> {
        let url = self.project_url(&["repository", "tree"])?;
        let url = http::with_query(
            url,
            &[
                ("path", self.layout.path()),
                ("ref", branch),
                ("recursive", "true"),
                ("per_page", PAGE_SIZE),
            ],
        );
        let Some(entries) = http::collect_pages::<TreeEntry, _, _>(
            PROVIDER,
            url,
            |page| self.authorize(self.client.get(page)),
            http::next_page_number,
        )
        .await?
        else {
            return Ok(None);
        };

        Ok(Some(
            entries
                .into_iter()
                .filter(|entry| entry.kind == "blob" && self.layout.owns(&entry.path))
                .map(|entry| entry.path)
                .collect(),
        ))
    }

    async fn existing_paths(&self, branch: &str) -> Result<HashSet<String>, StorageError> {
        match &self.layout {
            FileLayout::SingleFile(path) => {
                let url = self.project_url(&["repository", "files", path])?;
                let url = http::with_query(url, &[("ref", branch)]);
                let found = http::send_optional(PROVIDER, self.authorize(self.client.head(url)))
                    .await?
                    .is_some();
                Ok(found.then(|| path.clone()).into_iter().collect())
            }
            FileLayout::Directory(_) => Ok(self.tree(branch).await?.unwrap_or_default().into_iter().collect()),
        }
    }
}

#[async_trait]
impl RemoteStorageAdapter for GitLabAdapter {
    fn provider(&self) -> StorageProvider {
        PROVIDER
    }

    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError> {
        let files = match &self.layout {
            FileLayout::SingleFile(path) => self
                .raw_file(path.clone(), &self.branch)
                .await?
                .map(|file| vec![file]),
            FileLayout::Directory(_) => match self.tree(&self.branch).await? {
                Some(paths) if !paths.is_empty() => {
                    let reads = paths.into_iter().map(|path| self.raw_file(path, &self.branch));
                    Some(try_join_all(reads).await?.into_iter().flatten().collect())
                }
                _ => None,
            },
        };

        match files {
            Some(files) => {
                debug!("Read {} token files from GitLab {}", files.len(), self.project);
                Ok(Some(self.layout.decode(&files)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), StorageError> {
        let existing = self.existing_paths(&request.branch).await?;
        let files = self.layout.encode(&request.data)?;

        let mut actions: Vec<serde_json::Value> = files
            .iter()
            .map(|file| {
                let action = if existing.contains(&file.path) { "update" } else { "create" };
                json!({
                    "action": action,
                    "file_path": file.path,
                    "content": file.content,
                })
            })
            .collect();

        for stale in existing
            .iter()
            .filter(|path| !files.iter().any(|file| &file.path == *path))
        {
            actions.push(json!({ "action": "delete", "file_path": stale }));
        }

        let url = self.project_url(&["repository", "commits"])?;
        http::send(
            PROVIDER,
            self.authorize(self.client.post(url)).json(&json!({
                "branch": request.branch,
                "commit_message": request.message,
                "actions": actions,
            })),
        )
        .await?;

        info!(
            "Pushed {} file(s) to GitLab {}@{}",
            files.len(),
            self.project,
            request.branch
        );
        Ok(())
    }

    async fn fetch_branches(&self) -> Result<Option<Vec<String>>, StorageError> {
        let url = self.project_url(&["repository", "branches"])?;
        let url = http::with_query(url, &[("per_page", PAGE_SIZE)]);
        let branches: Vec<BranchResponse> = http::collect_pages(
            PROVIDER,
            url,
            |page| self.authorize(self.client.get(page)),
            http::next_page_number,
        )
        .await?
        .ok_or_else(|| StorageError::from_status(PROVIDER, 404, String::new()))?;

        let names: Vec<String> = branches.into_iter().map(|b| b.name).collect();
        Ok((!names.is_empty()).then_some(names))
    }

    async fn create_branch(&self, name: &str, from: &str) -> Result<bool, StorageError> {
        let url = self.project_url(&["repository", "branches"])?;
        let response = self
            .authorize(self.client.post(url))
            .json(&json!({ "branch": name, "ref": from }))
            .send()
            .await
            .map_err(|e| StorageError::from_reqwest(PROVIDER, &e))?;

        Ok(response.status().is_success())
    }

    async fn can_write(&self) -> Result<bool, StorageError> {
        let url = self.project_url(&[])?;
        let response = http::send(PROVIDER, self.authorize(self.client.get(url))).await?;
        let project: ProjectResponse = http::json(PROVIDER, response).await?;

        let level = [project.permissions.project_access, project.permissions.group_access]
            .into_iter()
            .flatten()
            .map(|access| access.access_level)
            .max()
            .unwrap_or(0);
        Ok(level >= DEVELOPER_ACCESS)
    }

    fn create_pull_request_url(&self, branch: &str) -> Option<String> {
        let mut url = Url::parse(&format!("{}/{}/-/merge_requests/new", self.web, self.project)).ok()?;
        url.query_pairs_mut()
            .append_pair("merge_request[source_branch]", branch);
        Some(url.to_string())
    }
}
