//! GitHub REST v3 adapter.
//!
//! Reads go through the contents API (single file) or the recursive tree plus
//! blob API (directory). A push is one commit built with the git data API.

use super::files::{FileLayout, RemoteFile};
use super::http;
use super::{RemoteStorageAdapter, SaveRequest};
use crate::error::storage::StorageError;
use crate::{GITHUB_API_URL, GITHUB_WEB_URL};

use models::{RemoteTokenData, StorageProvider, SyncContext};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::future::try_join_all;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use url::Url;

const PROVIDER: StorageProvider = StorageProvider::GitHub;
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
const ENTERPRISE_API_SUFFIX: &str = "/api/v3";
const FILE_MODE: &str = "100644";
const BRANCH_PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    sha: String,
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    tree: GitObject,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Permissions {
    #[serde(default)]
    push: bool,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    #[serde(default)]
    permissions: Permissions,
}

pub struct GitHubAdapter {
    client: Client,
    api: Url,
    web: String,
    owner: String,
    repo: String,
    branch: String,
    layout: FileLayout,
    token: String,
}

impl GitHubAdapter {
    /// # Errors
    ///
    /// [`StorageError::MissingId`] when `context.id` is not `owner/repo`, or
    /// the layout error from [`FileLayout::resolve`].
    pub fn new(client: Client, context: &SyncContext, multi_file: bool) -> Result<Self, StorageError> {
        let Some((owner, repo)) = context
            .id
            .trim()
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
        else {
            return Err(StorageError::missing_id(PROVIDER));
        };

        let api = http::api_base(context.base_url.as_deref(), GITHUB_API_URL)?;
        let web = match context.base_url.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            Some(base) => base
                .trim_end_matches('/')
                .trim_end_matches(ENTERPRISE_API_SUFFIX)
                .to_string(),
            None => GITHUB_WEB_URL.to_string(),
        };

        Ok(Self {
            client,
            api,
            web,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: context.branch_or_default().to_string(),
            layout: FileLayout::resolve(PROVIDER, context.file_path.as_deref(), multi_file)?,
            token: context.secret.expose().to_string(),
        })
    }

    fn repo_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut all = vec!["repos", self.owner.as_str(), self.repo.as_str()];
        all.extend_from_slice(segments);
        http::endpoint(&self.api, &all)
    }

    fn repo_url_with_path(&self, segments: &[&str], path: &str) -> Result<Url, StorageError> {
        let mut all = vec!["repos", self.owner.as_str(), self.repo.as_str()];
        all.extend_from_slice(segments);
        http::endpoint_with_path(&self.api, &all, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(API_VERSION_HEADER, API_VERSION);
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    async fn head_sha(&self, branch: &str) -> Result<Option<String>, StorageError> {
        let url = self.repo_url_with_path(&["git", "ref", "heads"], branch)?;
        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        let reference: RefResponse = http::json(PROVIDER, response).await?;
        Ok(Some(reference.object.sha))
    }

    async fn tree(&self, tree_ish: &str) -> Result<Option<TreeResponse>, StorageError> {
        let url = self.repo_url_with_path(&["git", "trees"], tree_ish)?;
        let url = http::with_query(url, &[("recursive", "1")]);
        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        Ok(Some(http::json(PROVIDER, response).await?))
    }

    async fn blob(&self, path: String, sha: String) -> Result<RemoteFile, StorageError> {
        let url = self.repo_url(&["git", "blobs", &sha])?;
        let response = http::send(PROVIDER, self.authorize(self.client.get(url))).await?;
        let blob: ContentResponse = http::json(PROVIDER, response).await?;
        Ok(RemoteFile::new(path, decode_base64(&blob.content)?))
    }

    async fn read_single(&self, path: &str) -> Result<Option<Vec<RemoteFile>>, StorageError> {
        let url = self.repo_url_with_path(&["contents"], path)?;
        let url = http::with_query(url, &[("ref", self.branch.as_str())]);
        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        let file: ContentResponse = http::json(PROVIDER, response).await?;
        Ok(Some(vec![RemoteFile::new(path, decode_base64(&file.content)?)]))
    }

    async fn read_directory(&self) -> Result<Option<Vec<RemoteFile>>, StorageError> {
        let Some(tree) = self.tree(&self.branch).await? else {
            return Ok(None);
        };

        let reads = tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob" && self.layout.owns(&entry.path))
            .map(|entry| self.blob(entry.path, entry.sha));

        let files = try_join_all(reads).await?;
        debug!("Read {} token files from GitHub {}/{}", files.len(), self.owner, self.repo);
        Ok((!files.is_empty()).then_some(files))
    }
}

fn decode_base64(content: &str) -> Result<String, StorageError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| StorageError::payload(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes).map_err(|e| StorageError::payload(format!("content is not UTF-8: {e}")))
}

#[async_trait]
impl RemoteStorageAdapter for GitHubAdapter {
    fn provider(&self) -> StorageProvider {
        PROVIDER
    }

    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError> {
        let files = match &self.layout {
            FileLayout::SingleFile(path) => self.read_single(path).await?,
            FileLayout::Directory(_) => self.read_directory().await?,
        };

        match files {
            Some(files) => Ok(Some(self.layout.decode(&files)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), StorageError> {
        let Some(head) = self.head_sha(&request.branch).await? else {
            return Err(StorageError::branch_creation(PROVIDER, &request.branch));
        };

        let commit_url = self.repo_url(&["git", "commits", &head])?;
        let response = http::send(PROVIDER, self.authorize(self.client.get(commit_url))).await?;
        let head_commit: CommitResponse = http::json(PROVIDER, response).await?;

        let files = self.layout.encode(&request.data)?;
        let mut entries: Vec<serde_json::Value> = files
            .iter()
            .map(|file| {
                json!({
                    "path": file.path,
                    "mode": FILE_MODE,
                    "type": "blob",
                    "content": file.content,
                })
            })
            .collect();

        // Sets deleted locally must disappear from the directory too.
        if self.layout.is_multi_file()
            && let Some(existing) = self.tree(&head_commit.tree.sha).await?
        {
            for entry in existing.tree {
                let stale = entry.kind == "blob"
                    && self.layout.owns(&entry.path)
                    && !files.iter().any(|file| file.path == entry.path);
                if stale {
                    entries.push(json!({
                        "path": entry.path,
                        "mode": FILE_MODE,
                        "type": "blob",
                        "sha": null,
                    }));
                }
            }
        }

        let trees_url = self.repo_url(&["git", "trees"])?;
        let response = http::send(
            PROVIDER,
            self.authorize(self.client.post(trees_url)).json(&json!({
                "base_tree": head_commit.tree.sha,
                "tree": entries,
            })),
        )
        .await?;
        let new_tree: TreeResponse = http::json(PROVIDER, response).await?;

        let commits_url = self.repo_url(&["git", "commits"])?;
        let response = http::send(
            PROVIDER,
            self.authorize(self.client.post(commits_url)).json(&json!({
                "message": request.message,
                "tree": new_tree.sha,
                "parents": [head],
            })),
        )
        .await?;
        let commit: GitObject = http::json(PROVIDER, response).await?;

        let ref_url = self.repo_url_with_path(&["git", "refs", "heads"], &request.branch)?;
        http::send(
            PROVIDER,
            self.authorize(self.client.patch(ref_url))
                .json(&json!({ "sha": commit.sha })),
        )
        .await?;

        info!(
            "Pushed {} file(s) to GitHub {}/{}@{}",
            files.len(),
            self.owner,
            self.repo,
            request.branch
        );
        Ok(())
    }

    async fn fetch_branches(&self) -> Result<Option<Vec<String>>, StorageError> {
        let url = self.repo_url(&["branches"])?;
        let url = http::with_query(url, &[("per_page", BRANCH_PAGE_SIZE)]);
        let branches: Vec<BranchResponse> = http::collect_pages(
            PROVIDER,
            url,
            |page| self.authorize(self.client.get(page)),
            http::next_link,
        )
        .await?
        .ok_or_else(|| StorageError::from_status(PROVIDER, 404, String::new()))?;

        let names: Vec<String> = branches.into_iter().map(|b| b.name).collect();
        Ok((!names.is_empty()).then_some(names))
    }

    async fn create_branch(&self, name: &str, from: &str) -> Result<bool, StorageError> {
        let Some(sha) = self.head_sha(from).await? else {
            return Ok(false);
        };

        let url = self.repo_url(&["git", "refs"])?;
        let response = self
            .authorize(self.client.post(url))
            .json(&json!({ "ref": format!("refs/heads/{name}"), "sha": sha }))
            .send()
            .await
            .map_err(|e| StorageError::from_reqwest(PROVIDER, &e))?;

        Ok(response.status().is_success())
    }

    async fn can_write(&self) -> Result<bool, StorageError> {
        let url = self.repo_url(&[])?;
        let response = http::send(PROVIDER, self.authorize(self.client.get(url))).await?;
        let repository: RepositoryResponse = http::json(PROVIDER, response).await?;
        Ok(repository.permissions.push)
    }

    fn create_pull_request_url(&self, branch: &str) -> Option<String> {
        Some(format!(
            "{}/{}/{}/compare/{}?expand=1",
            self.web, self.owner, self.repo, branch
        ))
    }
}
