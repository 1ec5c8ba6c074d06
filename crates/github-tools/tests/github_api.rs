//! HTTP-level tests against a stub GitHub server.

use github_tools::GithubToolset;
use atb_backend_core::ToolBackend;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_issue() -> serde_json::Value {
    json!({
        "number": 42,
        "title": "Found a bug",
        "state": "open",
        "html_url": "https://github.com/octocat/hello/issues/42",
        "body": "It crashes.",
        "user": {"login": "octocat"},
    })
}

#[tokio::test]
async fn create_issue_posts_and_reshapes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/octocat/hello/issues"))
        .and(header("Authorization", "Bearer ghp_test"))
        .and(header("Accept", "application/vnd.github+json"))
        .and(body_partial_json(json!({"title": "Found a bug"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(api_issue()))
        .expect(1)
        .mount(&server)
        .await;

    let toolset = GithubToolset::with_base_url("ghp_test", server.uri()).unwrap();
    let result = toolset
        .call(
            "create_issue",
            json!({"owner": "octocat", "repo": "hello", "title": "Found a bug"}),
        )
        .await
        .unwrap();

    assert_eq!(result["number"], 42);
    assert_eq!(result["url"], "https://github.com/octocat/hello/issues/42");
    assert_eq!(result["author"], "octocat");
    // optional body was not sent as an explicit null
    assert_eq!(result["body"], "It crashes.");
}

#[tokio::test]
async fn list_issues_defaults_state_to_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/issues"))
        .and(query_param("state", "open"))
        .and(query_param("per_page", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([api_issue()])))
        .expect(1)
        .mount(&server)
        .await;

    let toolset = GithubToolset::with_base_url("ghp_test", server.uri()).unwrap();
    let result = toolset
        .call("list_issues", json!({"owner": "octocat", "repo": "hello"}))
        .await
        .unwrap();

    let issues = result.as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["state"], "open");
}

#[tokio::test]
async fn vendor_rejection_maps_to_the_thrown_convention() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/octocat/hello/issues"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Validation Failed"})),
        )
        .mount(&server)
        .await;

    let toolset = GithubToolset::with_base_url("ghp_test", server.uri()).unwrap();
    let err = toolset
        .call(
            "create_issue",
            json!({"owner": "octocat", "repo": "hello", "title": "x"}),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to create issue: HTTP 422: Validation Failed"
    );
}
