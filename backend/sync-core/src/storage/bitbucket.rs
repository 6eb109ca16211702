//! Bitbucket Cloud REST 2.0 adapter.
//!
//! Everything goes through the `/src` endpoint. A push is a single
//! form-encoded POST where each field named after a file path carries that
//! file's content.

use super::files::{FileLayout, RemoteFile};
use super::http;
use super::{RemoteStorageAdapter, SaveRequest};
use crate::error::storage::StorageError;
use crate::{BITBUCKET_API_URL, BITBUCKET_WEB_URL};

use models::{RemoteTokenData, StorageProvider, SyncContext};

use async_trait::async_trait;
use futures_util::future::try_join_all;
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;
use url::form_urlencoded;

const PROVIDER: StorageProvider = StorageProvider::Bitbucket;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const PAGE_LEN: &str = "100";
const MAX_DEPTH: &str = "10";
const FILE_ENTRY: &str = "commit_file";

#[derive(Debug, Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct BranchTarget {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
    target: Option<BranchTarget>,
}

#[derive(Debug, Deserialize)]
struct RepositoryPermission {
    permission: String,
}

enum Credentials {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

pub struct BitbucketAdapter {
    client: Client,
    api: Url,
    workspace: String,
    repo: String,
    branch: String,
    layout: FileLayout,
    credentials: Credentials,
}

impl BitbucketAdapter {
    /// `context.secret` is either `username:app_password` or an access token.
    pub fn new(client: Client, context: &SyncContext, multi_file: bool) -> Result<Self, StorageError> {
        let Some((workspace, repo)) = context
            .id
            .trim()
            .split_once('/')
            .filter(|(workspace, repo)| !workspace.is_empty() && !repo.is_empty())
        else {
            return Err(StorageError::missing_id(PROVIDER));
        };

        let secret = context.secret.expose();
        let credentials = match secret.split_once(':') {
            _ if secret.is_empty() => Credentials::None,
            Some((username, password)) => Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            None => Credentials::Bearer(secret.to_string()),
        };

        Ok(Self {
            client,
            api: http::api_base(context.base_url.as_deref(), BITBUCKET_API_URL)?,
            workspace: workspace.to_string(),
            repo: repo.to_string(),
            branch: context.branch_or_default().to_string(),
            layout: FileLayout::resolve(PROVIDER, context.file_path.as_deref(), multi_file)?,
            credentials,
        })
    }

    fn repo_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut all = vec!["repositories", self.workspace.as_str(), self.repo.as_str()];
        all.extend_from_slice(segments);
        http::endpoint(&self.api, &all)
    }

    fn source_url(&self, branch: &str, path: &str) -> Result<Url, StorageError> {
        let mut all = vec![
            "repositories",
            self.workspace.as_str(),
            self.repo.as_str(),
            "src",
            branch,
        ];
        all.extend(path.split('/').filter(|s| !s.is_empty()));
        http::endpoint(&self.api, &all)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::None => request,
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
            Credentials::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Follows `next` links until the listing is exhausted.
    async fn paged<T: DeserializeOwned>(&self, first: Url) -> Result<Option<Vec<T>>, StorageError> {
        let mut values = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
            else {
                return Ok(None);
            };
            let page: Page<T> = http::json(PROVIDER, response).await?;
            values.extend(page.values);
            next = page.next.map(|link| Url::parse(&link)).transpose()?;
        }

        Ok(Some(values))
    }

    async fn read_file(&self, path: String) -> Result<Option<RemoteFile>, StorageError> {
        let url = self.source_url(&self.branch, &path)?;
        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        let content = http::text(PROVIDER, response).await?;
        Ok(Some(RemoteFile::new(path, content)))
    }

    async fn list_directory(&self, branch: &str) -> Result<Option<Vec<String>>, StorageError> {
        // The trailing slash asks for a listing instead of file content.
        let mut url = self.source_url(branch, self.layout.path())?;
        if let Ok(mut path) = url.path_segments_mut() {
            path.push("");
        }
        let url = http::with_query(url, &[("max_depth", MAX_DEPTH), ("pagelen", PAGE_LEN)]);

        let Some(entries) = self.paged::<SourceEntry>(url).await? else {
            return Ok(None);
        };
        Ok(Some(
            entries
                .into_iter()
                .filter(|entry| entry.kind == FILE_ENTRY && self.layout.owns(&entry.path))
                .map(|entry| entry.path)
                .collect(),
        ))
    }

    async fn branch_head(&self, branch: &str) -> Result<Option<String>, StorageError> {
        let url = self.repo_url(&["refs", "branches", branch])?;
        let Some(response) = http::send_optional(PROVIDER, self.authorize(self.client.get(url))).await?
        else {
            return Ok(None);
        };
        let branch: BranchResponse = http::json(PROVIDER, response).await?;
        Ok(branch.target.map(|target| target.hash))
    }
}

#[async_trait]
impl RemoteStorageAdapter for BitbucketAdapter {
    fn provider(&self) -> StorageProvider {
        PROVIDER
    }

    async fn retrieve(&self) -> Result<Option<RemoteTokenData>, StorageError> {
        let files = match &self.layout {
            FileLayout::SingleFile(path) => self.read_file(path.clone()).await?.map(|file| vec![file]),
            FileLayout::Directory(_) => match self.list_directory(&self.branch).await? {
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
                    "Read {} token files from Bitbucket {}/{}",
                    files.len(),
                    self.workspace,
                    self.repo
                );
                Ok(Some(self.layout.decode(&files)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), StorageError> {
        let files = self.layout.encode(&request.data)?;

        let existing = if self.layout.is_multi_file() {
            self.list_directory(&request.branch).await?.unwrap_or_default()
        } else {
            Vec::new()
        };

        let body = {
            let mut form = form_urlencoded::Serializer::new(String::new());
            form.append_pair("message", &request.message);
            form.append_pair("branch", &request.branch);
            for file in &files {
                form.append_pair(&file.path, &file.content);
            }
            // Listed paths without new content are deleted by the commit.
            for stale in existing
                .iter()
                .filter(|path| !files.iter().any(|file| &file.path == *path))
            {
                form.append_pair("files", stale);
            }
            form.finish()
        };

        let url = self.repo_url(&["src"])?;
        http::send(
            PROVIDER,
            self.authorize(self.client.post(url))
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body),
        )
        .await?;

        info!(
            "Pushed {} file(s) to Bitbucket {}/{}@{}",
            files.len(),
            self.workspace,
            self.repo,
            request.branch
        );
        Ok(())
    }

    async fn fetch_branches(&self) -> Result<Option<Vec<String>>, StorageError> {
        let url = self.repo_url(&["refs", "branches"])?;
        let url = http::with_query(url, &[("pagelen", PAGE_LEN)]);

        let branches = self.paged::<BranchResponse>(url).await?.unwrap_or_default();
        let names: Vec<String> = branches.into_iter().map(|b| b.name).collect();
        Ok((!names.is_empty()).then_some(names))
    }

    async fn create_branch(&self, name: &str, from: &str) -> Result<bool, StorageError> {
        let Some(hash) = self.branch_head(from).await? else {
            return Ok(false);
        };

        let url = self.repo_url(&["refs", "branches"])?;
        let response = self
            .authorize(self.client.post(url))
            .json(&json!({ "name": name, "target": { "hash": hash } }))
            .send()
            .await
            .map_err(|e| StorageError::from_reqwest(PROVIDER, &e))?;

        Ok(response.status().is_success())
    }

    async fn can_write(&self) -> Result<bool, StorageError> {
        let url = http::endpoint(&self.api, &["user", "permissions", "repositories"])?;
        let query = format!("repository.full_name=\"{}/{}\"", self.workspace, self.repo);
        let url = http::with_query(url, &[("q", query.as_str())]);

        let permissions = self
            .paged::<RepositoryPermission>(url)
            .await?
            .unwrap_or_default();
        Ok(permissions
            .iter()
            .any(|p| p.permission == "write" || p.permission == "admin"))
    }

    fn create_pull_request_url(&self, branch: &str) -> Option<String> {
        let mut url = Url::parse(&format!(
            "{BITBUCKET_WEB_URL}/{}/{}/pull-requests/new",
            self.workspace, self.repo
        ))
        .ok()?;
        url.query_pairs_mut().append_pair("source", branch);
        Some(url.to_string())
    }
}
