use super::{build, build_multi_file, git_context, json_body, requests, token_document};
use crate::helpers::sets_with;

use sync_core::error::storage::GIT_MULTIFILE_PERMISSION_ERROR;
use sync_core::storage::{AdapterFactory, AdapterOptions, DefaultAdapterFactory, SaveRequest};

use models::{RemoteTokenData, StorageProvider, SyncContext};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn given_single_file_when_retrieving_then_decodes_base64_contents() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/contents/tokens.json"))
        .and(query_param("ref", "main"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "content": BASE64.encode(token_document()) })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    let remote = remote.expect("file exists");
    assert_eq!(remote.tokens, sets_with(4));
    assert_eq!(remote.metadata.token_set_order, vec![String::from("global")]);
}

#[tokio::test]
async fn given_missing_file_when_retrieving_then_reachable_but_empty() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/contents/tokens.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let remote = adapter.retrieve().await.expect("404 is not an error");

    // THEN
    assert!(remote.is_none());
}

#[tokio::test]
async fn given_rejected_token_when_retrieving_then_github_credential_error() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let error = adapter.retrieve().await.expect_err("401 fails");

    // THEN
    assert_eq!(error.error_message(), "GITHUB_CREDENTIAL_ERROR");
    assert!(error.is_credential_error());
}

/// **VALUE**: A push is exactly one commit on top of the branch head.
///
/// **BUG THIS CATCHES**: Committing without the head as parent, which
/// rewrites history, or moving the ref to the tree instead of the commit.
#[tokio::test]
async fn given_branch_head_when_saving_then_builds_tree_commit_and_moves_ref() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "head-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/git/commits/head-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tree": { "sha": "tree-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tokens/git/trees"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree-2", "tree": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tokens/git/commits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "commit-2" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/acme/tokens/git/refs/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

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
    let tree = json_body(&posts[0]);
    assert_eq!(tree["base_tree"], json!("tree-1"));
    assert_eq!(tree["tree"][0]["path"], json!("tokens.json"));
    assert_eq!(tree["tree"][0]["content"], json!(token_document()));

    let commit = json_body(&posts[1]);
    assert_eq!(commit["parents"], json!(["head-1"]));
    assert_eq!(commit["tree"], json!("tree-2"));
    assert_eq!(commit["message"], json!("Update tokens"));

    let patch = requests(&server, "PATCH").await;
    assert_eq!(json_body(&patch[0])["sha"], json!("commit-2"));
}

#[tokio::test]
async fn given_unknown_branch_when_saving_then_fails_before_writing() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/git/ref/heads/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let result = adapter
        .save(&SaveRequest {
            branch: String::from("gone"),
            data: RemoteTokenData::new(sets_with(4)),
            message: String::from("Update tokens"),
        })
        .await;

    // THEN
    assert!(result.is_err());
    assert!(requests(&server, "POST").await.is_empty());
}

#[tokio::test]
async fn given_stale_set_file_when_saving_directory_then_file_is_deleted() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "head-1" } })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/git/commits/head-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tree": { "sha": "tree-1" } })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/git/trees/tree-1"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "tree-1",
            "tree": [
                { "path": "tokens/global.json", "type": "blob", "sha": "b1" },
                { "path": "tokens/old.json", "type": "blob", "sha": "b2" },
                { "path": "README.md", "type": "blob", "sha": "b3" },
            ],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tokens/git/trees"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree-2" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tokens/git/commits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "commit-2" })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/acme/tokens/git/refs/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    let adapter = build_multi_file(
        &git_context(StorageProvider::GitHub, &server).with_file_path("tokens"),
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
    let entries = json_body(&posts[0])["tree"]
        .as_array()
        .cloned()
        .expect("tree entries");
    let deleted: Vec<&str> = entries
        .iter()
        .filter(|entry| entry["sha"].is_null() && entry.get("content").is_none())
        .filter_map(|entry| entry["path"].as_str())
        .collect();
    assert_eq!(deleted, vec!["tokens/old.json"]);
    assert!(entries.iter().any(|entry| entry["path"] == json!("tokens/$themes.json")));
}

#[tokio::test]
async fn given_repository_branches_when_fetching_then_returns_names() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/branches"))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "name": "main" }, { "name": "develop" }])),
        )
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let branches = adapter.fetch_branches().await.expect("listing succeeds");

    // THEN
    assert_eq!(
        branches,
        Some(vec![String::from("main"), String::from("develop")])
    );
}

/// **VALUE**: Branches past the first page are still found.
///
/// **BUG THIS CATCHES**: Reading only the first 100 branches, so pushing to
/// a later branch tries to create it and fails.
#[tokio::test]
async fn given_linked_second_page_when_fetching_branches_then_both_pages_are_read() {
    // GIVEN: The second page is mounted first so it wins over the broader match
    let server = MockServer::start().await;
    let second = format!("{}/repos/acme/tokens/branches?per_page=100&page=2", server.uri());
    let link = format!("<{second}>; rel=\"next\", <{second}>; rel=\"last\"");
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/branches"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "release" }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/branches"))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", link.as_str())
                .set_body_json(json!([{ "name": "main" }, { "name": "develop" }])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let branches = adapter.fetch_branches().await.expect("listing succeeds");

    // THEN
    assert_eq!(
        branches,
        Some(vec![
            String::from("main"),
            String::from("develop"),
            String::from("release")
        ])
    );
}

#[tokio::test]
async fn given_empty_repository_when_fetching_branches_then_none() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let branches = adapter.fetch_branches().await.expect("listing succeeds");

    // THEN
    assert_eq!(branches, None);
}

#[tokio::test]
async fn given_base_branch_when_creating_branch_then_ref_points_at_its_head() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "head-1" } })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tokens/git/refs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let created = adapter.create_branch("feature", "main").await.expect("request succeeds");

    // THEN
    assert!(created);
    let posts = requests(&server, "POST").await;
    assert_eq!(
        json_body(&posts[0]),
        json!({ "ref": "refs/heads/feature", "sha": "head-1" })
    );
}

#[tokio::test]
async fn given_push_permission_when_checking_write_access_then_true() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tokens"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "permissions": { "push": true } })),
        )
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitHub, &server));

    // WHEN
    let writable = adapter.can_write().await.expect("check succeeds");

    // THEN
    assert!(writable);
}

#[test]
fn given_enterprise_api_url_when_building_pr_link_then_uses_web_host() {
    // GIVEN
    let context = SyncContext::new(StorageProvider::GitHub, "acme/tokens")
        .with_base_url("https://github.example.com/api/v3");

    // WHEN
    let url = build(&context).create_pull_request_url("feature");

    // THEN
    assert_eq!(
        url.as_deref(),
        Some("https://github.example.com/acme/tokens/compare/feature?expand=1")
    );
}

#[test]
fn given_directory_path_without_multi_file_when_building_then_permission_error() {
    // GIVEN
    let context = SyncContext::new(StorageProvider::GitHub, "acme/tokens").with_file_path("tokens");

    // WHEN
    let error = DefaultAdapterFactory::new(AdapterOptions::default())
        .create(&context)
        .err()
        .expect("directory needs multi-file");

    // THEN
    assert_eq!(error.error_message(), GIT_MULTIFILE_PERMISSION_ERROR);
}

#[test]
fn given_id_without_owner_when_building_then_missing_id() {
    // GIVEN
    let context = SyncContext::new(StorageProvider::GitHub, "tokens");

    // WHEN
    let error = DefaultAdapterFactory::new(AdapterOptions::default())
        .create(&context)
        .err()
        .expect("owner/repo required");

    // THEN
    assert_eq!(error.error_message(), "ID_NON_EXIST_ERROR");
}
