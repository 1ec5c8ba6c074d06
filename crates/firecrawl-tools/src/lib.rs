// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! firecrawl-tools
//!
//! Firecrawl adapter for the Agent Toolbelt: single-page scrapes, site
//! crawls, and URL discovery. Firecrawl wraps its own payloads in a
//! `{success, data}` envelope; the reshaping unwraps the vendor layer so the
//! toolbelt envelope is the only one callers see.
//!
//! Failure convention: envelope.

use anyhow::Result;
use async_trait::async_trait;
use atb_backend_core::{
    BackendIdentity, ToolBackend, compact, envelope_from_response, map_envelope_data, op_err,
    parse_params,
};
use atb_core::{RegistryError, ToolRegistry};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct ScrapeUrlParams {
    /// Page URL to scrape.
    url: String,
    /// Output formats: any of `markdown`, `html`, `links`.
    #[serde(default)]
    formats: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct StartCrawlParams {
    /// Root URL to crawl.
    url: String,
    /// Maximum number of pages to crawl.
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetCrawlStatusParams {
    /// Crawl job id returned by `start_crawl`.
    crawl_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MapUrlParams {
    /// Site URL to discover links for.
    url: String,
    /// Only return URLs containing this substring.
    #[serde(default)]
    search: Option<String>,
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Firecrawl backend adapter. Construct with an API key (`fc-...`).
pub struct FirecrawlToolset {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    registry: ToolRegistry,
}

impl FirecrawlToolset {
    /// Create an adapter against the public Firecrawl API.
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

    async fn post(&self, path: &str, body: Value, op: &str) -> Result<Value> {
        debug!(path, "posting");
        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        envelope_from_response(resp, op).await
    }

    async fn scrape_url(&self, p: ScrapeUrlParams) -> Result<Value> {
        let body = compact(json!({
            "url": p.url,
            "formats": p.formats.unwrap_or_else(|| vec!["markdown".into()]),
        }));
        let envelope = self.post("/v1/scrape", body, "scrape URL").await?;
        Ok(map_envelope_data(envelope, |raw| {
            let page = &raw["data"];
            json!({
                "markdown": page["markdown"].as_str().unwrap_or_default(),
                "html": page["html"].as_str().unwrap_or_default(),
                "title": page["metadata"]["title"].as_str().unwrap_or_default(),
                "status_code": page["metadata"]["statusCode"],
            })
        }))
    }

    async fn start_crawl(&self, p: StartCrawlParams) -> Result<Value> {
        let body = json!({"url": p.url, "limit": p.limit.unwrap_or(10)});
        let envelope = self.post("/v1/crawl", body, "start crawl").await?;
        Ok(map_envelope_data(envelope, |raw| {
            json!({"crawl_id": raw["id"], "url": raw["url"]})
        }))
    }

    async fn get_crawl_status(&self, p: GetCrawlStatusParams) -> Result<Value> {
        let op = "get crawl status";
        let resp = self
            .http
            .get(format!("{}/v1/crawl/{}", self.base_url, p.crawl_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let envelope = envelope_from_response(resp, op).await?;
        Ok(map_envelope_data(envelope, |raw| {
            json!({
                "status": raw["status"],
                "completed": raw["completed"],
                "total": raw["total"],
            })
        }))
    }

    async fn map_url(&self, p: MapUrlParams) -> Result<Value> {
        let body = compact(json!({"url": p.url, "search": p.search}));
        let envelope = self.post("/v1/map", body, "map URL").await?;
        Ok(map_envelope_data(envelope, |raw| {
            json!({"links": raw["links"].as_array().cloned().unwrap_or_default()})
        }))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<ScrapeUrlParams>(
            "scrape_url",
            "Scrape one page and return its content as Markdown.",
        )?
        .tool::<StartCrawlParams>("start_crawl", "Start crawling a site; returns a crawl id.")?
        .tool::<GetCrawlStatusParams>("get_crawl_status", "Check the progress of a crawl job.")?
        .tool::<MapUrlParams>("map_url", "Discover the URLs of a site without scraping them.")?
        .build())
}

#[async_trait]
impl ToolBackend for FirecrawlToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "firecrawl".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "scrape_url" => self.scrape_url(parse_params(params)?).await,
            "start_crawl" => self.start_crawl(parse_params(params)?).await,
            "get_crawl_status" => self.get_crawl_status(parse_params(params)?).await,
            "map_url" => self.map_url(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
