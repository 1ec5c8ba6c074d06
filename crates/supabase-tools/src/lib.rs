// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! supabase-tools
//!
//! Supabase management-API adapter for the Agent Toolbelt: organizations
//! and projects under a personal access token.
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

const DEFAULT_BASE_URL: &str = "https://api.supabase.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct ListProjectsParams {}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetProjectParams {
    /// Project ref, e.g. `abcdefghijklmnop`.
    project_ref: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListOrganizationsParams {}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateProjectParams {
    /// Project display name.
    name: String,
    /// Organization id the project belongs to.
    organization_id: String,
    /// Database password for the new project.
    db_pass: String,
    /// Region slug, e.g. `us-east-1`.
    region: String,
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

fn reshape_project(project: &Value) -> Value {
    json!({
        "id": project["id"],
        "ref": project.get("ref").cloned().unwrap_or(Value::Null),
        "name": project["name"],
        "region": project["region"],
        "status": project["status"].as_str().unwrap_or_default(),
        "created_at": project["created_at"],
    })
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Supabase backend adapter. Construct with a personal access token
/// (`sbp_...`).
pub struct SupabaseToolset {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
    registry: ToolRegistry,
}

impl SupabaseToolset {
    /// Create an adapter against the public management API.
    pub fn new(access_token: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Create an adapter against a custom base URL (for tests).
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: build_registry()?,
        })
    }

    async fn list_projects(&self, _p: ListProjectsParams) -> Result<Value> {
        let op = "list projects";
        let resp = self
            .http
            .get(format!("{}/v1/projects", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let projects = raw
            .as_array()
            .map(|list| list.iter().map(reshape_project).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(json!({"projects": projects}))
    }

    async fn get_project(&self, p: GetProjectParams) -> Result<Value> {
        let op = "get project";
        let resp = self
            .http
            .get(format!("{}/v1/projects/{}", self.base_url, p.project_ref))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_project(&raw))
    }

    async fn list_organizations(&self, _p: ListOrganizationsParams) -> Result<Value> {
        let op = "list organizations";
        let resp = self
            .http
            .get(format!("{}/v1/organizations", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(json!({"organizations": raw.as_array().cloned().unwrap_or_default()}))
    }

    async fn create_project(&self, p: CreateProjectParams) -> Result<Value> {
        let op = "create project";
        debug!(name = %p.name, region = %p.region, "creating project");
        let resp = self
            .http
            .post(format!("{}/v1/projects", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&json!({
                "name": p.name,
                "organization_id": p.organization_id,
                "db_pass": p.db_pass,
                "region": p.region,
            }))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_project(&raw))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<ListProjectsParams>("list_projects", "List all Supabase projects.")?
        .tool::<GetProjectParams>("get_project", "Fetch one Supabase project by ref.")?
        .tool::<ListOrganizationsParams>(
            "list_organizations",
            "List the organizations the token can manage.",
        )?
        .tool::<CreateProjectParams>("create_project", "Provision a new Supabase project.")?
        .build())
}

#[async_trait]
impl ToolBackend for SupabaseToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "supabase".to_string(),
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
            "list_organizations" => self.list_organizations(parse_params(params)?).await,
            "create_project" => self.create_project(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
