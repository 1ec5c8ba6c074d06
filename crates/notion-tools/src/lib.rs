// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! notion-tools
//!
//! Notion adapter for the Agent Toolbelt. Notion pages carry their title
//! inside a typed property bag, so the reshaping here flattens that into a
//! plain `{id, title, url}` record a model can actually use.
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

const DEFAULT_BASE_URL: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchPagesParams {
    /// Text to search page titles for.
    query: String,
    /// Page size (max 100).
    #[serde(default)]
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetPageParams {
    /// Page id (UUID).
    page_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreatePageParams {
    /// Parent page id the new page nests under.
    parent_page_id: String,
    /// Title of the new page.
    title: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AppendParagraphParams {
    /// Block or page id to append under.
    block_id: String,
    /// Paragraph text.
    text: String,
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

/// Flatten a Notion page object into `{id, title, url}`.
///
/// The title lives in whichever property has type `"title"`; databases name
/// it arbitrarily, so every property is scanned.
fn reshape_page(page: &Value) -> Value {
    let title = page
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props
                .values()
                .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
        })
        .and_then(|p| p.get("title"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    json!({
        "id": page["id"],
        "title": title,
        "url": page.get("url").cloned().unwrap_or(Value::String(String::new())),
    })
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Notion backend adapter. Construct with an internal integration token.
pub struct NotionToolset {
    http: reqwest::Client,
    token: String,
    base_url: String,
    registry: ToolRegistry,
}

impl NotionToolset {
    /// Create an adapter against the public Notion API.
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

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn search_pages(&self, p: SearchPagesParams) -> Result<Value> {
        let op = "search pages";
        debug!(query = %p.query, "searching pages");
        let resp = self
            .request(reqwest::Method::POST, "/v1/search")
            .json(&json!({
                "query": p.query,
                "page_size": p.page_size.unwrap_or(10),
                "filter": {"property": "object", "value": "page"},
            }))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let results = raw["results"]
            .as_array()
            .map(|pages| pages.iter().map(reshape_page).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(json!({"pages": results, "has_more": raw["has_more"].as_bool().unwrap_or(false)}))
    }

    async fn get_page(&self, p: GetPageParams) -> Result<Value> {
        let op = "get page";
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/v1/pages/{}", p.page_id),
            )
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_page(&raw))
    }

    async fn create_page(&self, p: CreatePageParams) -> Result<Value> {
        let op = "create page";
        let resp = self
            .request(reqwest::Method::POST, "/v1/pages")
            .json(&json!({
                "parent": {"page_id": p.parent_page_id},
                "properties": {
                    "title": {"title": [{"text": {"content": p.title}}]},
                },
            }))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_page(&raw))
    }

    async fn append_paragraph(&self, p: AppendParagraphParams) -> Result<Value> {
        let op = "append paragraph";
        let resp = self
            .request(
                reqwest::Method::PATCH,
                &format!("/v1/blocks/{}/children", p.block_id),
            )
            .json(&json!({
                "children": [{
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": {"rich_text": [{"type": "text", "text": {"content": p.text}}]},
                }],
            }))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let appended = raw["results"].as_array().map(Vec::len).unwrap_or(0);
        Ok(json!({"appended_blocks": appended}))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<SearchPagesParams>("search_pages", "Search Notion pages by title text.")?
        .tool::<GetPageParams>("get_page", "Fetch a Notion page's id, title, and URL.")?
        .tool::<CreatePageParams>("create_page", "Create a Notion page under a parent page.")?
        .tool::<AppendParagraphParams>(
            "append_paragraph",
            "Append a paragraph of text to a Notion page or block.",
        )?
        .build())
}

#[async_trait]
impl ToolBackend for NotionToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "notion".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "search_pages" => self.search_pages(parse_params(params)?).await,
            "get_page" => self.get_page(parse_params(params)?).await,
            "create_page" => self.create_page(parse_params(params)?).await,
            "append_paragraph" => self.append_paragraph(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
