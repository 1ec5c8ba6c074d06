// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! vercel-tools
//!
//! Vercel adapter for the Agent Toolbelt. Read-oriented: projects and
//! deployments, with the vendor's epoch-millisecond timestamps and nested
//! creator objects narrowed to flat fields.
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

const DEFAULT_BASE_URL: &str = "https://api.vercel.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct ListProjectsParams {
    /// Page size (max 100).
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetProjectParams {
    /// Project id or name.
    project: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListDeploymentsParams {
    /// Restrict to one project id.
    #[serde(default)]
    project_id: Option<String>,
    /// Page size (max 100).
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetDeploymentParams {
    /// Deployment id (`dpl_...`) or URL.
    deployment_id: String,
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

fn reshape_project(project: &Value) -> Value {
    json!({
        "id": project["id"],
        "name": project["name"],
        "framework": project["framework"].as_str().unwrap_or_default(),
        "updated_at": project["updatedAt"],
    })
}

fn reshape_deployment(deployment: &Value) -> Value {
    // list and get payloads disagree on the id key
    let id = deployment
        .get("uid")
        .or_else(|| deployment.get("id"))
        .cloned()
        .unwrap_or(Value::Null);
    json!({
        "id": id,
        "url": deployment["url"],
        "state": deployment
            .get("readyState")
            .or_else(|| deployment.get("state"))
            .and_then(Value::as_str)
            .unwrap_or_default(),
        "target": deployment["target"].as_str().unwrap_or_default(),
        "created_at": deployment
            .get("createdAt")
            .or_else(|| deployment.get("created"))
            .cloned()
            .unwrap_or(Value::Null),
    })
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Vercel backend adapter. Construct with an access token.
pub struct VercelToolset {
    http: reqwest::Client,
    token: String,
    base_url: String,
    registry: ToolRegistry,
}

impl VercelToolset {
    /// Create an adapter against the public Vercel API.
    pub fn new(token: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create an adapter against a custom base URL (for tests).
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

    async fn get(&self, path: &str, query: &[(&str, String)], op: &str) -> Result<Value> {
        debug!(path, "fetching");
        let resp = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        expect_success(resp, op).await
    }

    async fn list_projects(&self, p: ListProjectsParams) -> Result<Value> {
        let op = "list projects";
        let raw = self
            .get(
                "/v9/projects",
                &[("limit", p.limit.unwrap_or(20).to_string())],
                op,
            )
            .await?;
        let projects = raw["projects"]
            .as_array()
            .map(|list| list.iter().map(reshape_project).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(json!({"projects": projects}))
    }

    async fn get_project(&self, p: GetProjectParams) -> Result<Value> {
        let op = "get project";
        let raw = self
            .get(&format!("/v9/projects/{}", p.project), &[], op)
            .await?;
        Ok(reshape_project(&raw))
    }

    async fn list_deployments(&self, p: ListDeploymentsParams) -> Result<Value> {
        let op = "list deployments";
        let mut query = vec![("limit", p.limit.unwrap_or(20).to_string())];
        if let Some(project_id) = p.project_id {
            query.push(("projectId", project_id));
        }
        let raw = self.get("/v6/deployments", &query, op).await?;
        let deployments = raw["deployments"]
            .as_array()
            .map(|list| list.iter().map(reshape_deployment).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(json!({"deployments": deployments}))
    }

    async fn get_deployment(&self, p: GetDeploymentParams) -> Result<Value> {
        let op = "get deployment";
        let raw = self
            .get(&format!("/v13/deployments/{}", p.deployment_id), &[], op)
            .await?;
        Ok(reshape_deployment(&raw))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<ListProjectsParams>("list_projects", "List the account's Vercel projects.")?
        .tool::<GetProjectParams>("get_project", "Fetch one Vercel project by id or name.")?
        .tool::<ListDeploymentsParams>(
            "list_deployments",
            "List recent deployments, optionally for one project.",
        )?
        .tool::<GetDeploymentParams>(
            "get_deployment",
            "Fetch a deployment's state and URL by id.",
        )?
        .build())
}

#[async_trait]
impl ToolBackend for VercelToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "vercel".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "list_projects" => self.list_projects(parse_params(params)?).await,
            "get_project" => self.get_project(parse_params(params)?).await,
            "list_deployments" => self.list_deployments(parse_params(params)?).await,
            "get_deployment" => self.get_deployment(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
