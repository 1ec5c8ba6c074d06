// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! linear-tools
//!
//! Linear adapter for the Agent Toolbelt. Linear's API is GraphQL over
//! HTTP: every tool posts one document to `/graphql` and unwraps the `data`
//! member. GraphQL-level errors arrive with HTTP 200, so the adapter checks
//! the `errors` array explicitly before touching the payload.
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

const DEFAULT_BASE_URL: &str = "https://api.linear.app";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateIssueParams {
    /// Team id the issue belongs to.
    team_id: String,
    /// Issue title.
    title: String,
    /// Issue description in Markdown.
    #[serde(default)]
    description: Option<String>,
    /// Priority 0 (none) to 4 (urgent).
    #[serde(default)]
    priority: Option<u8>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListIssuesParams {
    /// Restrict to one team id.
    #[serde(default)]
    team_id: Option<String>,
    /// Page size (max 250).
    #[serde(default)]
    first: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdateIssueParams {
    /// Issue id to update.
    issue_id: String,
    /// New title.
    #[serde(default)]
    title: Option<String>,
    /// New description.
    #[serde(default)]
    description: Option<String>,
    /// Workflow state id to move the issue to.
    #[serde(default)]
    state_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListTeamsParams {}

// ---------------------------------------------------------------------------
// GraphQL documents
// ---------------------------------------------------------------------------

const ISSUE_FIELDS: &str = "id identifier title url state { name }";

fn issue_create_doc() -> String {
    format!(
        "mutation IssueCreate($input: IssueCreateInput!) {{ issueCreate(input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
    )
}

fn issues_doc() -> String {
    format!(
        "query Issues($first: Int!, $filter: IssueFilter) {{ issues(first: $first, filter: $filter) {{ nodes {{ {ISSUE_FIELDS} }} }} }}"
    )
}

fn issue_update_doc() -> String {
    format!(
        "mutation IssueUpdate($id: String!, $input: IssueUpdateInput!) {{ issueUpdate(id: $id, input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
    )
}

const TEAMS_DOC: &str = "query Teams { teams { nodes { id key name } } }";

fn reshape_issue(issue: &Value) -> Value {
    json!({
        "id": issue["id"],
        "identifier": issue["identifier"],
        "title": issue["title"],
        "url": issue["url"],
        "state": issue["state"]["name"].as_str().unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Linear backend adapter. Construct with a personal API key; Linear expects
/// the raw key in `Authorization`, without a `Bearer` prefix.
pub struct LinearToolset {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    registry: ToolRegistry,
}

impl LinearToolset {
    /// Create an adapter against the public Linear API.
    pub fn new(api_key: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create an adapter against a custom base URL (for tests).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: build_registry()?,
        })
    }

    async fn graphql(&self, query: String, variables: Value, op: &str) -> Result<Value> {
        debug!(operation = op, "posting GraphQL document");
        let resp = self
            .http
            .post(format!("{}/graphql", self.base_url))
            .header("Authorization", &self.api_key)
            .json(&json!({"query": query, "variables": variables}))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        if let Some(errors) = raw.get("errors").and_then(Value::as_array)
            && let Some(first) = errors.first()
        {
            let message = first["message"].as_str().unwrap_or("GraphQL error");
            return Err(op_err(op, message));
        }
        Ok(raw["data"].clone())
    }

    async fn create_issue(&self, p: CreateIssueParams) -> Result<Value> {
        let op = "create issue";
        let mut input = json!({"teamId": p.team_id, "title": p.title});
        if let Some(description) = p.description {
            input["description"] = Value::String(description);
        }
        if let Some(priority) = p.priority {
            input["priority"] = json!(priority);
        }
        let data = self
            .graphql(issue_create_doc(), json!({"input": input}), op)
            .await?;
        Ok(reshape_issue(&data["issueCreate"]["issue"]))
    }

    async fn list_issues(&self, p: ListIssuesParams) -> Result<Value> {
        let op = "list issues";
        let filter = p
            .team_id
            .map(|id| json!({"team": {"id": {"eq": id}}}))
            .unwrap_or(Value::Null);
        let data = self
            .graphql(
                issues_doc(),
                json!({"first": p.first.unwrap_or(25), "filter": filter}),
                op,
            )
            .await?;
        let issues = data["issues"]["nodes"]
            .as_array()
            .map(|nodes| nodes.iter().map(reshape_issue).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(json!({"issues": issues}))
    }

    async fn update_issue(&self, p: UpdateIssueParams) -> Result<Value> {
        let op = "update issue";
        let mut input = serde_json::Map::new();
        if let Some(title) = p.title {
            input.insert("title".into(), Value::String(title));
        }
        if let Some(description) = p.description {
            input.insert("description".into(), Value::String(description));
        }
        if let Some(state_id) = p.state_id {
            input.insert("stateId".into(), Value::String(state_id));
        }
        let data = self
            .graphql(
                issue_update_doc(),
                json!({"id": p.issue_id, "input": Value::Object(input)}),
                op,
            )
            .await?;
        Ok(reshape_issue(&data["issueUpdate"]["issue"]))
    }

    async fn list_teams(&self, _p: ListTeamsParams) -> Result<Value> {
        let op = "list teams";
        let data = self
            .graphql(TEAMS_DOC.to_string(), json!({}), op)
            .await?;
        Ok(json!({"teams": data["teams"]["nodes"].as_array().cloned().unwrap_or_default()}))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<CreateIssueParams>("create_issue", "Create a Linear issue in a team.")?
        .tool::<ListIssuesParams>(
            "list_issues",
            "List Linear issues, optionally filtered to one team.",
        )?
        .tool::<UpdateIssueParams>(
            "update_issue",
            "Update a Linear issue's title, description, or workflow state.",
        )?
        .tool::<ListTeamsParams>("list_teams", "List the workspace's teams with ids and keys.")?
        .build())
}

#[async_trait]
impl ToolBackend for LinearToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "linear".to_string(),
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
            "update_issue" => self.update_issue(parse_params(params)?).await,
            "list_teams" => self.list_teams(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
