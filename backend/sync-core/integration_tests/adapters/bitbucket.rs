use super::{build, build_multi_file, git_context, requests, token_document};
use crate::helpers::sets_with;

use sync_core::storage::SaveRequest;

use models::{RemoteTokenData, StorageProvider, SyncContext};

use serde_json::json;
use url::form_urlencoded;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn given_app_password_when_retrieving_then_uses_basic_auth_on_src() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repositories/acme/tokens/src/main/tokens.json"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(token_document()))
        .expect(1)
        .mount(&server)
        .await;
    let context = git_context(StorageProvider::Bitbucket, &server).with_secret("user:pass");
    let adapter = build(&context);

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    assert_eq!(remote.expect("file exists").tokens, sets_with(4));
}

#[tokio::test]
async fn given_paged_branch_listing_when_fetching_then_follows_next_links() {
    // GIVEN
    let server = MockServer::start().await;
    let next = format!("{}/repositories/acme/tokens/refs/branches?page=2", server.uri());
    Mock::given(method("GET"))
        .and(path("/repositories/acme/tokens/refs/branches"))
        .and(query_param("pagelen", "100"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{ "name": "main" }],
            "next": next,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repositories/acme/tokens/refs/branches"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{ "name": "develop" }],
        })))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::Bitbucket, &server));

    // WHEN
    let branches = adapter.fetch_branches().await.expect("listing succeeds");

    // THEN
    assert_eq!(
        branches,
        Some(vec![String::from("main"), String::from("develop")])
    );
}

#[tokio::test]
async fn given_tokens_when_saving_then_posts_form_with_file_field() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repositories/acme/tokens/src"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::Bitbucket, &server));

    // WHEN
    adapter
        .save(&SaveRequest {
            branch: String::from("main"),
            data: RemoteTokenData::new(sets_with(4)),
            message: String::from("Update tokens"),
        })
        .await
        .expect("save succeeds");

    // THEN
    let posts = requests(&server, "POST").await;
    let fields: Vec<(String, String)> = form_urlencoded::parse(&posts[0].body)
        .into_owned()
        .collect();
    assert!(fields.contains(&(String::from("message"), String::from("Update tokens"))));
    assert!(fields.contains(&(String::from("branch"), String::from("main"))));
    assert!(fields.contains(&(String::from("tokens.json"), token_document())));
}

/// **VALUE**: Multi-file saves list the directory before posting, and
/// files no longer backed by a set are removed in the same commit.
///
/// **BUG THIS CATCHES**: Leaving deleted sets behind on the remote.
#[tokio::test]
async fn given_stale_set_file_when_saving_directory_then_form_deletes_it() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repositories/acme/tokens/src/main/tokens/"))
        .and(query_param("max_depth", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                { "path": "tokens/global.json", "type": "commit_file" },
                { "path": "tokens/old.json", "type": "commit_file" },
                { "path": "tokens/nested", "type": "commit_directory" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repositories/acme/tokens/src"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build_multi_file(
        &git_context(StorageProvider::Bitbucket, &server).with_file_path("tokens"),
    );

    // WHEN
    adapter
        .save(&SaveRequest {
            branch: String::from("main"),
            data: RemoteTokenData::new(sets_with(4)),
            message: String::from("Update tokens"),
        })
        .await
        .expect("save succeeds");

    // THEN
    let posts = requests(&server, "POST").await;
    let fields: Vec<(String, String)> = form_urlencoded::parse(&posts[0].body)
        .into_owned()
        .collect();
    let deleted: Vec<&str> = fields
        .iter()
        .filter(|(key, _)| key == "files")
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(deleted, vec!["tokens/old.json"]);
    assert!(fields.iter().any(|(key, _)| key == "tokens/global.json"));
    assert!(fields.iter().any(|(key, _)| key == "tokens/$themes.json"));
}

#[tokio::test]
async fn given_missing_file_when_retrieving_then_reachable_but_empty() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::Bitbucket, &server));

    // WHEN
    let remote = adapter.retrieve().await.expect("404 is not an error");

    // THEN
    assert!(remote.is_none());
}

#[test]
fn given_branch_when_building_pr_link_then_uses_bitbucket_web() {
    // GIVEN
    let context = SyncContext::new(StorageProvider::Bitbucket, "acme/tokens");

    // WHEN
    let url = build(&context).create_pull_request_url("feature");

    // THEN
    assert_eq!(
        url.as_deref(),
        Some("https://bitbucket.org/acme/tokens/pull-requests/new?source=feature")
    );
}
