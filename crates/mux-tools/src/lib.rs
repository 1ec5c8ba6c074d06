// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! mux-tools
//!
//! Mux Video adapter for the Agent Toolbelt. Every Mux response nests the
//! payload under a `data` member; the reshaping unwraps that and narrows an
//! asset to its id, status, duration, and first public playback id.
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

const DEFAULT_BASE_URL: &str = "https://api.mux.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateAssetParams {
    /// URL of the source video to ingest.
    input_url: String,
    /// Playback policy: `public` or `signed`.
    #[serde(default)]
    playback_policy: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetAssetParams {
    /// Asset id.
    asset_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListAssetsParams {
    /// Page size (max 100).
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateLiveStreamParams {
    /// Playback policy: `public` or `signed`.
    #[serde(default)]
    playback_policy: Option<String>,
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

fn first_playback_id(resource: &Value) -> String {
    resource["playback_ids"]
        .as_array()
        .and_then(|ids| ids.first())
        .and_then(|p| p["id"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn reshape_asset(asset: &Value) -> Value {
    json!({
        "id": asset["id"],
        "status": asset["status"],
        "duration": asset["duration"].as_f64().unwrap_or(0.0),
        "playback_id": first_playback_id(asset),
        "created_at": asset["created_at"],
    })
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Mux backend adapter. Construct with an access-token id + secret pair.
pub struct MuxToolset {
    http: reqwest::Client,
    token_id: String,
    token_secret: String,
    base_url: String,
    registry: ToolRegistry,
}

impl MuxToolset {
    /// Create an adapter against the public Mux API.
    pub fn new(
        token_id: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Self::with_base_url(token_id, token_secret, DEFAULT_BASE_URL)
    }

    /// Create an adapter against a custom base URL (for tests).
    pub fn with_base_url(
        token_id: impl Into<String>,
        token_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            token_id: token_id.into(),
            token_secret: token_secret.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: build_registry()?,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .basic_auth(&self.token_id, Some(&self.token_secret))
    }

    async fn create_asset(&self, p: CreateAssetParams) -> Result<Value> {
        let op = "create asset";
        debug!(input = %p.input_url, "creating asset");
        let resp = self
            .request(reqwest::Method::POST, "/video/v1/assets")
            .json(&json!({
                "input": [{"url": p.input_url}],
                "playback_policy": [p.playback_policy.unwrap_or_else(|| "public".into())],
            }))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_asset(&raw["data"]))
    }

    async fn get_asset(&self, p: GetAssetParams) -> Result<Value> {
        let op = "get asset";
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/video/v1/assets/{}", p.asset_id),
            )
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_asset(&raw["data"]))
    }

    async fn list_assets(&self, p: ListAssetsParams) -> Result<Value> {
        let op = "list assets";
        let resp = self
            .request(reqwest::Method::GET, "/video/v1/assets")
            .query(&[("limit", p.limit.unwrap_or(25).to_string())])
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let assets = raw["data"]
            .as_array()
            .map(|list| list.iter().map(reshape_asset).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(json!({"assets": assets}))
    }

    async fn create_live_stream(&self, p: CreateLiveStreamParams) -> Result<Value> {
        let op = "create live stream";
        let resp = self
            .request(reqwest::Method::POST, "/video/v1/live-streams")
            .json(&json!({
                "playback_policy": [p.playback_policy.unwrap_or_else(|| "public".into())],
                "new_asset_settings": {"playback_policy": ["public"]},
            }))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let stream = &raw["data"];
        Ok(json!({
            "id": stream["id"],
            "status": stream["status"],
            "stream_key": stream["stream_key"],
            "playback_id": first_playback_id(stream),
        }))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<CreateAssetParams>("create_asset", "Ingest a video from a URL as a Mux asset.")?
        .tool::<GetAssetParams>("get_asset", "Fetch a Mux asset's status and playback id.")?
        .tool::<ListAssetsParams>("list_assets", "List recent Mux assets.")?
        .tool::<CreateLiveStreamParams>(
            "create_live_stream",
            "Create a live stream and return its stream key.",
        )?
        .build())
}

#[async_trait]
impl ToolBackend for MuxToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "mux".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "create_asset" => self.create_asset(parse_params(params)?).await,
            "get_asset" => self.get_asset(parse_params(params)?).await,
            "list_assets" => self.list_assets(parse_params(params)?).await,
            "create_live_stream" => self.create_live_stream(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
