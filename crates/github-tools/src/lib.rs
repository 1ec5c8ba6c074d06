// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! github-tools
//!
//! GitHub REST adapter for the Agent Toolbelt. Wraps a handful of repository
//! operations (issues, comments, pull requests) as dispatchable tools.
//!
//! Failure convention: thrown — vendor rejections surface as errors whose
//! message reads `"Failed to <operation>: <cause>"`.

use anyhow::Result;
use async_trait::async_trait;
use atb_backend_core::{
    BackendIdentity, ToolBackend, compact, expect_success, op_err, parse_params,
};
use atb_core::{RegistryError, ToolRegistry};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.github.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateIssueParams {
    /// Repository owner (user or organization login).
    owner: String,
    /// Repository name.
    repo: String,
    /// Issue title.
    title: String,
    /// Issue body in Markdown.
    #[serde(default)]
    body: Option<String>,
    /// Labels to apply.
    #[serde(default)]
    labels: Option<Vec<String>>,
    /// Logins to assign.
    #[serde(default)]
    assignees: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListIssuesParams {
    /// Repository owner.
    owner: String,
    /// Repository name.
    repo: String,
    /// Issue state filter: `open`, `closed`, or `all`.
    #[serde(default)]
    state: Option<String>,
    /// Page size (max 100).
    #[serde(default)]
    per_page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddIssueCommentParams {
    /// Repository owner.
    owner: String,
    /// Repository name.
    repo: String,
    /// Issue number.
    issue_number: u64,
    /// Comment body in Markdown.
    body: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetRepositoryParams {
    /// Repository owner.
    owner: String,
    /// Repository name.
    repo: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreatePullRequestParams {
    /// Repository owner.
    owner: String,
    /// Repository name.
    repo: String,
    /// Pull request title.
    title: String,
    /// Branch with the changes.
    head: String,
    /// Branch to merge into.
    base: String,
    /// Pull request body in Markdown.
    #[serde(default)]
    body: Option<String>,
    /// Open as a draft.
    #[serde(default)]
    draft: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    body: Option<String>,
    user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

/// The reshaped issue returned to callers.
#[derive(Debug, Serialize)]
pub struct Issue {
    /// Issue number within the repository.
    pub number: u64,
    /// Title.
    pub title: String,
    /// `open` or `closed`.
    pub state: String,
    /// Browser URL.
    pub url: String,
    /// Body, empty when the issue has none.
    pub body: String,
    /// Author login, empty for ghost users.
    pub author: String,
}

impl From<ApiIssue> for Issue {
    fn from(api: ApiIssue) -> Self {
        Self {
            number: api.number,
            title: api.title,
            state: api.state,
            url: api.html_url,
            body: api.body.unwrap_or_default(),
            author: api.user.map(|u| u.login).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    full_name: String,
    description: Option<String>,
    html_url: String,
    default_branch: String,
    stargazers_count: u64,
    open_issues_count: u64,
    private: bool,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    draft: Option<bool>,
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// GitHub backend adapter. Construct with a personal access token or a
/// GitHub App installation token.
pub struct GithubToolset {
    http: reqwest::Client,
    token: String,
    base_url: String,
    registry: ToolRegistry,
}

impl GithubToolset {
    /// Create an adapter against the public GitHub API.
    pub fn new(token: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create an adapter against a custom base URL (GitHub Enterprise, or a
    /// test server).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: build_registry()?,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "agent-toolbelt")
    }

    async fn create_issue(&self, p: CreateIssueParams) -> Result<Value> {
        let op = "create issue";
        debug!(owner = %p.owner, repo = %p.repo, "creating issue");
        let body = compact(json!({
            "title": p.title,
            "body": p.body,
            "labels": p.labels,
            "assignees": p.assignees,
        }));
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/repos/{}/{}/issues", p.owner, p.repo),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let issue: ApiIssue = serde_json::from_value(raw).map_err(|e| op_err(op, e))?;
        serde_json::to_value(Issue::from(issue)).map_err(|e| op_err(op, e))
    }

    async fn list_issues(&self, p: ListIssuesParams) -> Result<Value> {
        let op = "list issues";
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/repos/{}/{}/issues", p.owner, p.repo),
            )
            .query(&[
                ("state", p.state.unwrap_or_else(|| "open".into())),
                ("per_page", p.per_page.unwrap_or(30).to_string()),
            ])
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let issues: Vec<ApiIssue> = serde_json::from_value(raw).map_err(|e| op_err(op, e))?;
        let reshaped: Vec<Issue> = issues.into_iter().map(Issue::from).collect();
        serde_json::to_value(reshaped).map_err(|e| op_err(op, e))
    }

    async fn add_issue_comment(&self, p: AddIssueCommentParams) -> Result<Value> {
        let op = "add issue comment";
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!(
                    "/repos/{}/{}/issues/{}/comments",
                    p.owner, p.repo, p.issue_number
                ),
            )
            .json(&json!({"body": p.body}))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(json!({
            "id": raw["id"],
            "url": raw["html_url"],
            "body": raw["body"],
        }))
    }

    async fn get_repository(&self, p: GetRepositoryParams) -> Result<Value> {
        let op = "get repository";
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/repos/{}/{}", p.owner, p.repo),
            )
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let repo: ApiRepository = serde_json::from_value(raw).map_err(|e| op_err(op, e))?;
        Ok(json!({
            "full_name": repo.full_name,
            "description": repo.description.unwrap_or_default(),
            "url": repo.html_url,
            "default_branch": repo.default_branch,
            "stars": repo.stargazers_count,
            "open_issues": repo.open_issues_count,
            "private": repo.private,
        }))
    }

    async fn create_pull_request(&self, p: CreatePullRequestParams) -> Result<Value> {
        let op = "create pull request";
        let body = compact(json!({
            "title": p.title,
            "head": p.head,
            "base": p.base,
            "body": p.body,
            "draft": p.draft,
        }));
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/repos/{}/{}/pulls", p.owner, p.repo),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let pr: ApiPullRequest = serde_json::from_value(raw).map_err(|e| op_err(op, e))?;
        Ok(json!({
            "number": pr.number,
            "title": pr.title,
            "state": pr.state,
            "url": pr.html_url,
            "draft": pr.draft.unwrap_or(false),
        }))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<CreateIssueParams>("create_issue", "Create an issue in a GitHub repository.")?
        .tool::<ListIssuesParams>(
            "list_issues",
            "List issues in a GitHub repository, optionally filtered by state.",
        )?
        .tool::<AddIssueCommentParams>(
            "add_issue_comment",
            "Add a comment to an existing GitHub issue.",
        )?
        .tool::<GetRepositoryParams>("get_repository", "Fetch metadata about a GitHub repository.")?
        .tool::<CreatePullRequestParams>(
            "create_pull_request",
            "Open a pull request between two branches.",
        )?
        .build())
}

#[async_trait]
impl ToolBackend for GithubToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "github".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "create_issue" => self.create_issue(parse_params(params)?).await,
            "list_issues" => self.list_issues(parse_params(params)?).await,
            "add_issue_comment" => self.add_issue_comment(parse_params(params)?).await,
            "get_repository" => self.get_repository(parse_params(params)?).await,
            "create_pull_request" => self.create_pull_request(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
