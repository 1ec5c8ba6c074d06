// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! jira-tools
//!
//! JIRA Cloud adapter for the Agent Toolbelt. Unlike most vendors there is
//! no global API host — every site has its own — so the constructor takes
//! the site base URL alongside the basic-auth pair (account email + API
//! token). Rich-text fields (descriptions, comments) must be Atlassian
//! Document Format; plain text from the model is wrapped into a single
//! ADF paragraph.
//!
//! Failure convention: thrown.

use anyhow::Result;
use async_trait::async_trait;
use atb_backend_core::{BackendIdentity, ToolBackend, expect_success, op_err, parse_params};
use atb_core::{RegistryError, ToolRegistry};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateIssueParams {
    /// Project key, e.g. `ENG`.
    project_key: String,
    /// Issue summary (title).
    summary: String,
    /// Issue type name, e.g. `Task` or `Bug`.
    issue_type: String,
    /// Plain-text description.
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetIssueParams {
    /// Issue key, e.g. `ENG-42`.
    issue_key: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchIssuesParams {
    /// JQL query, e.g. `project = ENG AND status = "In Progress"`.
    jql: String,
    /// Page size (max 100).
    #[serde(default)]
    max_results: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddCommentParams {
    /// Issue key to comment on.
    issue_key: String,
    /// Plain-text comment body.
    body: String,
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

/// Wrap plain text in a minimal ADF document.
fn adf_paragraph(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{"type": "text", "text": text}],
        }],
    })
}

fn reshape_issue(issue: &Value) -> Value {
    let fields = &issue["fields"];
    json!({
        "key": issue["key"],
        "summary": fields["summary"],
        "status": fields["status"]["name"].as_str().unwrap_or_default(),
        "issue_type": fields["issuetype"]["name"].as_str().unwrap_or_default(),
        "assignee": fields["assignee"]["displayName"].as_str().unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// JIRA Cloud backend adapter.
pub struct JiraToolset {
    http: reqwest::Client,
    email: String,
    api_token: String,
    base_url: String,
    registry: ToolRegistry,
}

impl JiraToolset {
    /// Create an adapter for one JIRA site, e.g.
    /// `https://acme.atlassian.net`.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            email: email.into(),
            api_token: api_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: build_registry()?,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
    }

    async fn create_issue(&self, p: CreateIssueParams) -> Result<Value> {
        let op = "create issue";
        debug!(project = %p.project_key, "creating issue");
        let mut fields = json!({
            "project": {"key": p.project_key},
            "summary": p.summary,
            "issuetype": {"name": p.issue_type},
        });
        if let Some(description) = p.description {
            fields["description"] = adf_paragraph(&description);
        }
        let resp = self
            .request(reqwest::Method::POST, "/rest/api/3/issue")
            .json(&json!({"fields": fields}))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(json!({"key": raw["key"], "id": raw["id"]}))
    }

    async fn get_issue(&self, p: GetIssueParams) -> Result<Value> {
        let op = "get issue";
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/rest/api/3/issue/{}", p.issue_key),
            )
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_issue(&raw))
    }

    async fn search_issues(&self, p: SearchIssuesParams) -> Result<Value> {
        let op = "search issues";
        let resp = self
            .request(reqwest::Method::GET, "/rest/api/3/search")
            .query(&[
                ("jql", p.jql),
                ("maxResults", p.max_results.unwrap_or(25).to_string()),
            ])
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let issues = raw["issues"]
            .as_array()
            .map(|list| list.iter().map(reshape_issue).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(json!({"issues": issues, "total": raw["total"]}))
    }

    async fn add_comment(&self, p: AddCommentParams) -> Result<Value> {
        let op = "add comment";
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/rest/api/3/issue/{}/comment", p.issue_key),
            )
            .json(&json!({"body": adf_paragraph(&p.body)}))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(json!({"id": raw["id"], "created": raw["created"]}))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<CreateIssueParams>("create_issue", "Create a JIRA issue in a project.")?
        .tool::<GetIssueParams>("get_issue", "Fetch a JIRA issue by key.")?
        .tool::<SearchIssuesParams>("search_issues", "Search JIRA issues with a JQL query.")?
        .tool::<AddCommentParams>("add_comment", "Add a comment to a JIRA issue.")?
        .build())
}

#[async_trait]
impl ToolBackend for JiraToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "jira".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "create_issue" => self.create_issue(parse_params(params)?).await,
            "get_issue" => self.get_issue(parse_params(params)?).await,
            "search_issues" => self.search_issues(parse_params(params)?).await,
            "add_comment" => self.add_comment(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_the_expected_tools() {
        let toolset =
            JiraToolset::new("https://acme.atlassian.net", "me@acme.dev", "tok").unwrap();
        let names: Vec<&str> = toolset
            .registry()
            .tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["create_issue", "get_issue", "search_issues", "add_comment"]
        );
    }

    #[test]
    fn adf_wraps_plain_text_in_one_paragraph() {
        let doc = adf_paragraph("hello");
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["version"], 1);
        assert_eq!(doc["content"][0]["content"][0]["text"], "hello");
    }

    #[test]
    fn reshape_narrows_nested_fields() {
        let issue = json!({
            "key": "ENG-1",
            "fields": {
                "summary": "Broken build",
                "status": {"name": "To Do"},
                "issuetype": {"name": "Bug"},
                "assignee": null,
            },
        });
        let reshaped = reshape_issue(&issue);
        assert_eq!(reshaped["key"], "ENG-1");
        assert_eq!(reshaped["status"], "To Do");
        assert_eq!(reshaped["assignee"], "");
    }
}
