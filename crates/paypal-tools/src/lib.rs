// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! paypal-tools
//!
//! PayPal Checkout adapter for the Agent Toolbelt. The adapter takes a
//! ready-made OAuth access token; performing the client-credentials exchange
//! (and refreshing) is the surrounding application's job. Mutating calls
//! send a `PayPal-Request-Id` so replays are idempotent.
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
use uuid::Uuid;

const DEFAULT_BASE_URL: &str = "https://api-m.paypal.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateOrderParams {
    /// Amount as a decimal string, e.g. `"24.99"`.
    amount: String,
    /// Three-letter ISO currency code, uppercase.
    currency: String,
    /// Line-item description shown to the payer.
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CaptureOrderParams {
    /// Order id to capture.
    order_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetOrderParams {
    /// Order id to fetch.
    order_id: String,
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

fn reshape_order(order: &Value) -> Value {
    let amount = &order["purchase_units"][0]["amount"];
    let approve_url = order["links"]
        .as_array()
        .and_then(|links| {
            links
                .iter()
                .find(|l| l["rel"].as_str() == Some("approve"))
        })
        .and_then(|l| l["href"].as_str())
        .unwrap_or_default();
    json!({
        "id": order["id"],
        "status": order["status"],
        "amount": amount["value"].as_str().unwrap_or_default(),
        "currency": amount["currency_code"].as_str().unwrap_or_default(),
        "approve_url": approve_url,
    })
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// PayPal backend adapter.
pub struct PaypalToolset {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
    registry: ToolRegistry,
}

impl PaypalToolset {
    /// Create an adapter against the live PayPal API.
    pub fn new(access_token: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Create an adapter against the sandbox or a test server.
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

    async fn create_order(&self, p: CreateOrderParams) -> Result<Value> {
        let op = "create order";
        debug!(amount = %p.amount, currency = %p.currency, "creating order");
        let mut unit = json!({
            "amount": {"currency_code": p.currency, "value": p.amount},
        });
        if let Some(description) = p.description {
            unit["description"] = Value::String(description);
        }
        let resp = self
            .http
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&self.access_token)
            .header("PayPal-Request-Id", Uuid::new_v4().to_string())
            .json(&json!({"intent": "CAPTURE", "purchase_units": [unit]}))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_order(&raw))
    }

    async fn capture_order(&self, p: CaptureOrderParams) -> Result<Value> {
        let op = "capture order";
        let resp = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, p.order_id
            ))
            .bearer_auth(&self.access_token)
            .header("PayPal-Request-Id", Uuid::new_v4().to_string())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(json!({"id": raw["id"], "status": raw["status"]}))
    }

    async fn get_order(&self, p: GetOrderParams) -> Result<Value> {
        let op = "get order";
        let resp = self
            .http
            .get(format!(
                "{}/v2/checkout/orders/{}",
                self.base_url, p.order_id
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        Ok(reshape_order(&raw))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<CreateOrderParams>(
            "create_order",
            "Create a PayPal checkout order for an amount; returns the payer approval URL.",
        )?
        .tool::<CaptureOrderParams>(
            "capture_order",
            "Capture payment for an order the payer has approved.",
        )?
        .tool::<GetOrderParams>("get_order", "Fetch a checkout order's status.")?
        .build())
}

#[async_trait]
impl ToolBackend for PaypalToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "paypal".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "create_order" => self.create_order(parse_params(params)?).await,
            "capture_order" => self.capture_order(parse_params(params)?).await,
            "get_order" => self.get_order(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
