// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! twilio-tools
//!
//! Twilio adapter for the Agent Toolbelt. Twilio's classic API is
//! form-encoded with the account SID in the path and basic auth (SID +
//! auth token). WhatsApp messages ride the same Messages endpoint with a
//! `whatsapp:` prefix on both addresses.
//!
//! Failure convention: envelope.

use anyhow::Result;
use async_trait::async_trait;
use atb_backend_core::{
    BackendIdentity, ToolBackend, envelope_from_response, map_envelope_data, op_err, parse_params,
};
use atb_core::{RegistryError, ToolRegistry};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct SendSmsParams {
    /// Destination number in E.164 form, e.g. `+15551234567`.
    to: String,
    /// Sending number owned by the account.
    from: String,
    /// Message text.
    body: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SendWhatsappParams {
    /// Destination number in E.164 form (without the `whatsapp:` prefix).
    to: String,
    /// Sending number enabled for WhatsApp.
    from: String,
    /// Message text.
    body: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetMessageParams {
    /// Message SID, e.g. `SM...`.
    message_sid: String,
}

// ---------------------------------------------------------------------------
// Toolset
// ---------------------------------------------------------------------------

/// Twilio backend adapter.
pub struct TwilioToolset {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
    registry: ToolRegistry,
}

impl TwilioToolset {
    /// Create an adapter against the public Twilio API.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Self::with_base_url(account_sid, auth_token, DEFAULT_BASE_URL)
    }

    /// Create an adapter against a custom base URL (for tests).
    pub fn with_base_url(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: build_registry()?,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }

    async fn send_message(&self, to: String, from: String, body: String, op: &str) -> Result<Value> {
        debug!(to = %to, "sending message");
        let resp = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let envelope = envelope_from_response(resp, op).await?;
        Ok(map_envelope_data(envelope, reshape_message))
    }

    async fn send_sms(&self, p: SendSmsParams) -> Result<Value> {
        self.send_message(p.to, p.from, p.body, "send SMS").await
    }

    async fn send_whatsapp(&self, p: SendWhatsappParams) -> Result<Value> {
        self.send_message(
            format!("whatsapp:{}", p.to),
            format!("whatsapp:{}", p.from),
            p.body,
            "send WhatsApp message",
        )
        .await
    }

    async fn get_message(&self, p: GetMessageParams) -> Result<Value> {
        let op = "get message";
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages/{}.json",
            self.base_url, self.account_sid, p.message_sid
        );
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| op_err(op, e))?;
        let envelope = envelope_from_response(resp, op).await?;
        Ok(map_envelope_data(envelope, reshape_message))
    }
}

/// Narrow Twilio's sprawling message resource to what a model needs.
fn reshape_message(message: &Value) -> Value {
    json!({
        "sid": message["sid"],
        "status": message["status"],
        "to": message["to"],
        "from": message["from"],
        "body": message["body"],
        "error_message": message["error_message"].as_str().unwrap_or_default(),
    })
}

fn build_registry() -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder()
        .tool::<SendSmsParams>("send_sms", "Send an SMS text message.")?
        .tool::<SendWhatsappParams>("send_whatsapp", "Send a WhatsApp message.")?
        .tool::<GetMessageParams>("get_message", "Fetch a message's delivery status by SID.")?
        .build())
}

#[async_trait]
impl ToolBackend for TwilioToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "twilio".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        match name {
            "send_sms" => self.send_sms(parse_params(params)?).await,
            "send_whatsapp" => self.send_whatsapp(parse_params(params)?).await,
            "get_message" => self.get_message(parse_params(params)?).await,
            other => Err(anyhow::anyhow!("unsupported tool: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_the_expected_tools() {
        let toolset = TwilioToolset::new("AC123", "token").unwrap();
        let names: Vec<&str> = toolset
            .registry()
            .tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["send_sms", "send_whatsapp", "get_message"]);
    }

    #[test]
    fn all_sms_fields_are_required() {
        let toolset = TwilioToolset::new("AC123", "token").unwrap();
        let descriptor = toolset.registry().descriptor("send_sms").unwrap();
        let required = descriptor.parameters["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
    }

    #[test]
    fn reshape_defaults_error_message() {
        let reshaped = reshape_message(&json!({
            "sid": "SM1",
            "status": "queued",
            "to": "+15550001111",
            "from": "+15552223333",
            "body": "hi",
            "error_message": null,
        }));
        assert_eq!(reshaped["error_message"], "");
        assert_eq!(reshaped["status"], "queued");
    }
}
