// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! resend-tools
//!
//! Resend adapter for the Agent Toolbelt.
//!
//! Failure convention: envelope — vendor rejections come back as
//! `{success: false, error}` success values rather than raised errors, so an
//! orchestration loop can hand the failure text straight back to the model.
//! Transport faults (the request never got an HTTP response) still raise.

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

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct SendEmailParams {
    /// Sender, e.g. `Acme <noreply@acme.dev>`.
    from: String,
    /// Recipient addresses.
    to: Vec<String>,
    /// Subject line.
    subject: String,
    /// HTML body.
    #[serde(default)]
    html: Option<String>,
    /// Plain-text body.
    #[serde(default)]
    text: Option<String>,
    /// Reply-to address.
    #[serde(default)]
    reply_to: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SendBatchParams {
    /// The emails to send, each with `from`, `to`, `subject`, and a body.
    emails: Vec<BatchEmail>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BatchEmail {
    /// Sender address.
    from: String,
    /// Recipient addresses.
    to: Vec<String>,
    /// Subject line.
    subject: String,
    /// HTML body.
    #[serde(default)]
    html: Option<String>,
    /// Plain-text body.
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetEmailParams {
    /// Email id returned from a send.
    email_id: String,
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Resend backend adapter. Construct with an API key (`re_...`).
pub struct ResendToolset {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    registry: ToolRegistry,
}

impl ResendToolset {
    /// Create an adapter against the public Resend API.
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

    async fn send_email(&self, p: SendEmailParams) -> Result<Value> {
        let op = "send email";
        debug!(to = ?p.to, subject = %p.subject, "sending email");
        let body = compact(json!({
            "from": p.from,
            "to": p.to,
            "subject": p.subject,
            "html": p.html,
            "text": p.text,
            "reply_to": p.reply_to,
        }));
        let resp = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        envelope_from_response(resp, op).await
    }

    /// One aggregate vendor call; per-item success is whatever the vendor
    /// response says, the adapter does not split the batch.
    async fn send_batch(&self, p: SendBatchParams) -> Result<Value> {
        let op = "send batch";
        let emails: Vec<Value> = p
            .emails
            .into_iter()
            .map(|e| {
                compact(json!({
                    "from": e.from,
                    "to": e.to,
                    "subject": e.subject,
                    "html": e.html,
                    "text": e.text,
                }))
            })
            .collect();
        let resp = self
            .http
            .post(format!("{}/emails/batch", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&emails)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        envelope_from_response(resp, op).await
    }

    async fn get_email(&self, p: GetEmailParams) -> Result<Value> {
        let op = "get email";
        let resp = self
            .http
            .get(format!("{}/emails/{}", self.base_url, p.email_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let envelope = envelope_from_response(resp, op).await?;
        Ok(map_envelope_data(envelope, |email| {
            json!({
                "id": email["id"],
                "from": email["from"],
                "to": email["to"],
                "subject": email["subject"],
                "last_event": email["last_event"].as_str().unwrap_or_default(),
            })
        }))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<SendEmailParams>("send_email", "Send a transactional email via Resend.")?
        .tool::<SendBatchParams>(
            "send_batch",
            "Send up to 100 emails in one batch; returns the vendor's aggregate result.",
        )?
        .tool::<GetEmailParams>("get_email", "Fetch a sent email's delivery status.")?
        .build())
}

#[async_trait]
impl ToolBackend for ResendToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "resend".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "send_email" => self.send_email(parse_params(params)?).await,
            "send_batch" => self.send_batch(parse_params(params)?).await,
            "get_email" => self.get_email(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
