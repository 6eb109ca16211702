//! HTTP plumbing shared by the adapters.

use crate::error::storage::StorageError;

use models::StorageProvider;

use std::time::Duration;

use reqwest::header::LINK;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

pub const USER_AGENT: &str = "token-sync";

const NEXT_PAGE_HEADER: &str = "x-next-page";

pub fn build_client(timeout: Duration, provider: StorageProvider) -> Result<Client, StorageError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| StorageError::from_reqwest(provider, &e))
}

/// Parses `base` (or `default` when unset) as an API root.
pub fn api_base(base: Option<&str>, default: &str) -> Result<Url, StorageError> {
    let raw = base
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(default);
    Ok(Url::parse(raw.trim_end_matches('/'))?)
}

/// Appends path segments to `base`, percent-encoding each one.
///
/// A segment containing `/` is encoded as a single segment (`%2F`), which is
/// what GitLab expects for project ids and file paths.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, StorageError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| StorageError::invalid_url(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Like [`endpoint`], but `path` keeps its `/` separators.
pub fn endpoint_with_path(base: &Url, segments: &[&str], path: &str) -> Result<Url, StorageError> {
    let mut all: Vec<&str> = segments.to_vec();
    all.extend(path.split('/').filter(|s| !s.is_empty()));
    endpoint(base, &all)
}

pub fn with_query(mut url: Url, pairs: &[(&str, &str)]) -> Url {
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    url
}

/// Sends `request`, turning transport failures and non-success statuses
/// into [`StorageError`].
pub async fn send(provider: StorageProvider, request: RequestBuilder) -> Result<Response, StorageError> {
    let response = request
        .send()
        .await
        .map_err(|e| StorageError::from_reqwest(provider, &e))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(StorageError::from_status(provider, status, body));
    }

    Ok(response)
}

/// Like [`send`], but a 404 is `Ok(None)`.
pub async fn send_optional(
    provider: StorageProvider,
    request: RequestBuilder,
) -> Result<Option<Response>, StorageError> {
    let response = request
        .send()
        .await
        .map_err(|e| StorageError::from_reqwest(provider, &e))?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(StorageError::from_status(provider, status, body));
    }

    Ok(Some(response))
}

pub async fn json<T: DeserializeOwned>(
    provider: StorageProvider,
    response: Response,
) -> Result<T, StorageError> {
    response
        .json::<T>()
        .await
        .map_err(|e| StorageError::from_reqwest(provider, &e))
}

pub async fn text(provider: StorageProvider, response: Response) -> Result<String, StorageError> {
    response
        .text()
        .await
        .map_err(|e| StorageError::from_reqwest(provider, &e))
}

/// Reads every page of a JSON array listing, starting at `first`.
///
/// `request` builds the authorised request for one page URL, and `next`
/// picks the following page from the response headers. A 404 on the first
/// page is `Ok(None)`.
pub async fn collect_pages<T, R, N>(
    provider: StorageProvider,
    first: Url,
    request: R,
    next: N,
) -> Result<Option<Vec<T>>, StorageError>
where
    T: DeserializeOwned,
    R: Fn(Url) -> RequestBuilder,
    N: Fn(&Response, &Url) -> Option<Url>,
{
    let mut items = Vec::new();
    let mut next_url = Some(first);
    let mut first_page = true;

    while let Some(url) = next_url.take() {
        let response = if first_page {
            match send_optional(provider, request(url.clone())).await? {
                Some(response) => response,
                None => return Ok(None),
            }
        } else {
            send(provider, request(url.clone())).await?
        };
        first_page = false;

        next_url = next(&response, &url).filter(|following| *following != url);
        let page: Vec<T> = json(provider, response).await?;
        items.extend(page);
    }

    Ok(Some(items))
}

/// The `rel="next"` target of a `Link` header.
pub fn next_link(response: &Response, _current: &Url) -> Option<Url> {
    let header = response.headers().get(LINK)?.to_str().ok()?;
    header.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|param| param.trim().replace(' ', "") == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}

/// `current` with its `page` parameter set from an `X-Next-Page` header.
/// The header is empty on the last page.
pub fn next_page_number(response: &Response, current: &Url) -> Option<Url> {
    let page = response
        .headers()
        .get(NEXT_PAGE_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .to_string();
    if page.is_empty() {
        return None;
    }

    let kept: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = current.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page);
    Some(url)
}
