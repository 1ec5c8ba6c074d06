// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! stripe-tools
//!
//! Stripe adapter for the Agent Toolbelt. The Stripe API is form-encoded;
//! amounts are integers in the currency's minor unit (cents for USD). Every
//! mutating call sends an `Idempotency-Key` header so an orchestration layer
//! that replays a tool call cannot double-charge.
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

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateCustomerParams {
    /// Customer email address.
    email: String,
    /// Full name.
    #[serde(default)]
    name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreatePaymentIntentParams {
    /// Amount in the currency's minor unit (e.g. cents).
    amount: u64,
    /// Three-letter ISO currency code, lowercase.
    currency: String,
    /// Existing customer id to attach the intent to.
    #[serde(default)]
    customer: Option<String>,
    /// Statement description.
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListChargesParams {
    /// Restrict to one customer id.
    #[serde(default)]
    customer: Option<String>,
    /// Page size (max 100).
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateRefundParams {
    /// Payment intent to refund.
    payment_intent: String,
    /// Partial refund amount in minor units; omit for a full refund.
    #[serde(default)]
    amount: Option<u64>,
    /// Reason: `duplicate`, `fraudulent`, or `requested_by_customer`.
    #[serde(default)]
    reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiCustomer {
    id: String,
    email: Option<String>,
    name: Option<String>,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct ApiPaymentIntent {
    id: String,
    amount: u64,
    currency: String,
    status: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCharge {
    id: String,
    amount: u64,
    currency: String,
    status: String,
    paid: bool,
    receipt_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiList<T> {
    data: Vec<T>,
    has_more: bool,
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Stripe backend adapter. Construct with a secret key (`sk_...`).
pub struct StripeToolset {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
    registry: ToolRegistry,
}

impl StripeToolset {
    /// Create an adapter against the live Stripe API.
    pub fn new(secret_key: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_base_url(secret_key, DEFAULT_BASE_URL)
    }

    /// Create an adapter against a custom base URL (stripe-mock, or a test
    /// server).
    pub fn with_base_url(
        secret_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: build_registry()?,
        })
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)], op: &str) -> Result<Value> {
        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(form)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        expect_success(resp, op).await
    }

    async fn create_customer(&self, p: CreateCustomerParams) -> Result<Value> {
        let op = "create customer";
        debug!(email = %p.email, "creating customer");
        let mut form = vec![("email", p.email)];
        if let Some(name) = p.name {
            form.push(("name", name));
        }
        if let Some(description) = p.description {
            form.push(("description", description));
        }
        let raw = self.post_form("/v1/customers", &form, op).await?;
        let customer: ApiCustomer = serde_json::from_value(raw).map_err(|e| op_err(op, e))?;
        Ok(json!({
            "id": customer.id,
            "email": customer.email.unwrap_or_default(),
            "name": customer.name.unwrap_or_default(),
            "created": customer.created,
        }))
    }

    async fn create_payment_intent(&self, p: CreatePaymentIntentParams) -> Result<Value> {
        let op = "create payment intent";
        let mut form = vec![
            ("amount", p.amount.to_string()),
            ("currency", p.currency),
        ];
        if let Some(customer) = p.customer {
            form.push(("customer", customer));
        }
        if let Some(description) = p.description {
            form.push(("description", description));
        }
        let raw = self.post_form("/v1/payment_intents", &form, op).await?;
        let intent: ApiPaymentIntent = serde_json::from_value(raw).map_err(|e| op_err(op, e))?;
        Ok(json!({
            "id": intent.id,
            "amount": intent.amount,
            "currency": intent.currency,
            "status": intent.status,
            "client_secret": intent.client_secret.unwrap_or_default(),
        }))
    }

    async fn list_charges(&self, p: ListChargesParams) -> Result<Value> {
        let op = "list charges";
        let mut query = vec![("limit", p.limit.unwrap_or(10).to_string())];
        if let Some(customer) = p.customer {
            query.push(("customer", customer));
        }
        let resp = self
            .http
            .get(format!("{}/v1/charges", self.base_url))
            .bearer_auth(&self.secret_key)
            .query(&query)
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let raw = expect_success(resp, op).await?;
        let list: ApiList<ApiCharge> = serde_json::from_value(raw).map_err(|e| op_err(op, e))?;
        let charges: Vec<Value> = list
            .data
            .into_iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "amount": c.amount,
                    "currency": c.currency,
                    "status": c.status,
                    "paid": c.paid,
                    "receipt_url": c.receipt_url.unwrap_or_default(),
                })
            })
            .collect();
        Ok(json!({"charges": charges, "has_more": list.has_more}))
    }

    async fn create_refund(&self, p: CreateRefundParams) -> Result<Value> {
        let op = "create refund";
        let mut form = vec![("payment_intent", p.payment_intent)];
        if let Some(amount) = p.amount {
            form.push(("amount", amount.to_string()));
        }
        if let Some(reason) = p.reason {
            form.push(("reason", reason));
        }
        let raw = self.post_form("/v1/refunds", &form, op).await?;
        Ok(json!({
            "id": raw["id"],
            "status": raw["status"],
            "amount": raw["amount"],
        }))
    }
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<CreateCustomerParams>("create_customer", "Create a Stripe customer.")?
        .tool::<CreatePaymentIntentParams>(
            "create_payment_intent",
            "Create a payment intent for an amount in the currency's minor unit.",
        )?
        .tool::<ListChargesParams>(
            "list_charges",
            "List recent charges, optionally for one customer.",
        )?
        .tool::<CreateRefundParams>(
            "create_refund",
            "Refund a payment intent, fully or partially.",
        )?
        .build())
}

#[async_trait]
impl ToolBackend for StripeToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "stripe".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "create_customer" => self.create_customer(parse_params(params)?).await,
            "create_payment_intent" => self.create_payment_intent(parse_params(params)?).await,
            "list_charges" => self.list_charges(parse_params(params)?).await,
            "create_refund" => self.create_refund(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}
