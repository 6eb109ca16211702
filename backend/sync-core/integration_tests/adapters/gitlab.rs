use super::{build, git_context, json_body, requests, token_document};
use crate::helpers::sets_with;

use sync_core::storage::SaveRequest;

use models::{RemoteTokenData, StorageProvider, SyncContext};

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "/api/v4/projects/acme%2Ftokens";

fn save_request() -> SaveRequest {
    SaveRequest {
        branch: String::from("main"),
        data: RemoteTokenData::new(sets_with(4)),
        message: String::from("Update tokens"),
    }
}

#[tokio::test]
async fn given_project_path_when_retrieving_then_reads_raw_file_with_encoded_project() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PROJECT}/repository/files/tokens.json/raw")))
        .and(query_param("ref", "main"))
        .and(header("private-token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(token_document()))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitLab, &server));

    // WHEN
    let remote = adapter.retrieve().await.expect("retrieve succeeds");

    // THEN
    assert_eq!(remote.expect("file exists").tokens, sets_with(4));
}

#[tokio::test]
async fn given_existing_file_when_saving_then_commit_updates_it() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("{PROJECT}/repository/files/tokens.json")))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT}/repository/commits")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "c1" })))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitLab, &server));

    // WHEN
    adapter.save(&save_request()).await.expect("save succeeds");

    // THEN
    let body = json_body(&requests(&server, "POST").await[0]);
    assert_eq!(body["branch"], json!("main"));
    assert_eq!(body["commit_message"], json!("Update tokens"));
    assert_eq!(
        body["actions"],
        json!([{
            "action": "update",
            "file_path": "tokens.json",
            "content": token_document(),
        }])
    );
}

#[tokio::test]
async fn given_new_file_when_saving_then_commit_creates_it() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("{PROJECT}/repository/files/tokens.json")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT}/repository/commits")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "c1" })))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitLab, &server));

    // WHEN
    adapter.save(&save_request()).await.expect("save succeeds");

    // THEN
    let body = json_body(&requests(&server, "POST").await[0]);
    assert_eq!(body["actions"][0]["action"], json!("create"));
}

#[tokio::test]
async fn given_next_page_header_when_fetching_branches_then_both_pages_are_read() {
    // GIVEN: The second page is mounted first so it wins over the broader match
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PROJECT}/repository/branches")))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-next-page", "")
                .set_body_json(json!([{ "name": "release" }])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{PROJECT}/repository/branches")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-next-page", "2")
                .set_body_json(json!([{ "name": "main" }])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitLab, &server));

    // WHEN
    let branches = adapter.fetch_branches().await.expect("listing succeeds");

    // THEN
    assert_eq!(
        branches,
        Some(vec![String::from("main"), String::from("release")])
    );
}

#[tokio::test]
async fn given_forbidden_project_when_fetching_branches_then_gitlab_credential_error() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PROJECT}/repository/branches")))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitLab, &server));

    // WHEN
    let error = adapter.fetch_branches().await.expect_err("403 fails");

    // THEN
    assert_eq!(error.error_message(), "GITLAB_CREDENTIAL_ERROR");
}

#[tokio::test]
async fn given_reporter_access_when_checking_write_access_then_false() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROJECT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "permissions": {
                "project_access": { "access_level": 20 },
                "group_access": null,
            },
        })))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitLab, &server));

    // WHEN
    let writable = adapter.can_write().await.expect("check succeeds");

    // THEN
    assert!(!writable);
}

#[tokio::test]
async fn given_group_developer_access_when_checking_write_access_then_true() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROJECT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "permissions": {
                "project_access": null,
                "group_access": { "access_level": 30 },
            },
        })))
        .mount(&server)
        .await;
    let adapter = build(&git_context(StorageProvider::GitLab, &server));

    // WHEN
    let writable = adapter.can_write().await.expect("check succeeds");

    // THEN
    assert!(writable);
}

#[test]
fn given_self_hosted_api_url_when_building_mr_link_then_points_at_web_host() {
    // GIVEN
    let context = SyncContext::new(StorageProvider::GitLab, "acme/tokens")
        .with_base_url("https://gitlab.example.com/api/v4");

    // WHEN
    let url = build(&context).create_pull_request_url("feature");

    // THEN
    assert_eq!(
        url.as_deref(),
        Some(
            "https://gitlab.example.com/acme/tokens/-/merge_requests/new?merge_request%5Bsource_branch%5D=feature"
        )
    );
}
