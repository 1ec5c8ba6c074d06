#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Shared backend abstractions for vendor tool adapters.
//!
//! Every vendor crate implements [`ToolBackend`]: it owns its registry,
//! identifies itself, and executes one tool per call. The free helpers here
//! keep error shaping uniform across adapters: a vendor failure surfaces
//! either as `"Failed to <operation>: <cause>"` (throwing adapters) or as a
//! [`CallOutcome`] envelope (envelope adapters).

use anyhow::Result;
use async_trait::async_trait;
use atb_core::{CallOutcome, ToolRegistry};
use serde_json::Value;

/// Identity metadata advertised by a backend adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendIdentity {
    /// Vendor identifier, e.g. `"github"`.
    pub id: String,
    /// Version of the adapter crate, if known.
    pub adapter_version: Option<String>,
}

/// A vendor adapter that can execute named tools.
///
/// Implementations are single-shot passthroughs: one authenticated network
/// call per invocation, no retries, no pagination beyond the first page, no
/// mutation of the validated parameter bag. Concurrency is unconstrained,
/// since `call` borrows `self` immutably and adapters hold no mutable state.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Identity metadata for this adapter.
    fn identity(&self) -> BackendIdentity;

    /// The registry of tools this adapter executes.
    ///
    /// Built once at construction; the dispatcher validates against it
    /// before every delegation, so `call` only ever sees schema-conformant
    /// parameters.
    fn registry(&self) -> &ToolRegistry;

    /// Execute the named tool with validated parameters.
    async fn call(&self, name: &str, params: Value) -> Result<Value>;
}

/// Shape a vendor failure into the thrown-convention error message.
///
/// ```
/// use atb_backend_core::op_err;
///
/// let err = op_err("create issue", "HTTP 403: rate limited");
/// assert_eq!(err.to_string(), "Failed to create issue: HTTP 403: rate limited");
/// ```
pub fn op_err(operation: &str, cause: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("Failed to {operation}: {cause}")
}

/// Consume a response, raising the thrown-convention error on non-success.
///
/// On a 2xx status the body is parsed as JSON and returned. Anything else
/// becomes `"Failed to <operation>: <detail>"`, where the detail is the
/// vendor's error message when one can be extracted from the body.
pub async fn expect_success(resp: reqwest::Response, operation: &str) -> Result<Value> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<Value>()
            .await
            .map_err(|e| op_err(operation, format!("invalid JSON response: {e}")));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(op_err(operation, error_detail(status, &body)))
}

/// Consume a response into a [`CallOutcome`] envelope, never raising for
/// vendor-side rejections. Transport faults (unreadable body) still raise.
pub async fn envelope_from_response(resp: reqwest::Response, operation: &str) -> Result<Value> {
    let status = resp.status();
    if status.is_success() {
        let data = resp
            .json::<Value>()
            .await
            .map_err(|e| op_err(operation, format!("invalid JSON response: {e}")))?;
        return Ok(CallOutcome::ok(data).into());
    }
    let body = resp.text().await.unwrap_or_default();
    Ok(CallOutcome::err(error_detail(status, &body)).into())
}

/// Deserialize a validated parameter bag into its typed struct.
///
/// The dispatcher has already enforced the schema, so a mismatch here means
/// the schema and the struct disagree, which is a defect, not a caller error.
pub fn parse_params<P: serde::de::DeserializeOwned>(params: Value) -> Result<P> {
    serde_json::from_value(params)
        .map_err(|e| anyhow::anyhow!("parameters did not match the declared schema: {e}"))
}

/// Drop `null` members from a JSON object so optional request fields are
/// omitted rather than sent as explicit nulls (several vendors reject the
/// latter).
pub fn compact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .collect(),
        ),
        other => other,
    }
}

/// Reshape the `data` member of a success envelope, leaving failures alone.
pub fn map_envelope_data(mut envelope: Value, f: impl FnOnce(&Value) -> Value) -> Value {
    if envelope["success"] == Value::Bool(true) {
        let reshaped = f(&envelope["data"]);
        envelope["data"] = reshaped;
    }
    envelope
}

/// Pull a human-readable cause out of a vendor error body.
///
/// Vendors disagree on where the message lives (`message`, `error`,
/// `error.message`, `error_description`); fall back to the raw status line.
pub fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        for key in ["message", "error_description", "detail"] {
            if let Some(s) = v.get(key).and_then(Value::as_str) {
                return Some(s.to_string());
            }
        }
        match v.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(obj) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            None => None,
        }
    });

    match message {
        Some(m) => format!("HTTP {}: {m}", status.as_u16()),
        None => format!("HTTP {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn op_err_formats_the_thrown_convention() {
        let err = op_err("send SMS", "HTTP 401");
        assert_eq!(err.to_string(), "Failed to send SMS: HTTP 401");
    }

    #[test]
    fn detail_prefers_message_field() {
        let detail = error_detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "Validation Failed"}"#,
        );
        assert_eq!(detail, "HTTP 422: Validation Failed");
    }

    #[test]
    fn detail_reads_nested_error_object() {
        let detail = error_detail(
            StatusCode::PAYMENT_REQUIRED,
            r#"{"error": {"message": "Your card was declined."}}"#,
        );
        assert_eq!(detail, "HTTP 402: Your card was declined.");
    }

    #[test]
    fn detail_reads_flat_error_string() {
        let detail = error_detail(StatusCode::BAD_REQUEST, r#"{"error": "bad input"}"#);
        assert_eq!(detail, "HTTP 400: bad input");
    }

    #[test]
    fn detail_falls_back_to_status_for_opaque_bodies() {
        let detail = error_detail(StatusCode::BAD_GATEWAY, "<html>nope</html>");
        assert_eq!(detail, "HTTP 502");
    }

    #[test]
    fn map_envelope_data_leaves_failures_alone() {
        let failed = map_envelope_data(
            serde_json::json!({"success": false, "error": "nope"}),
            |_| panic!("must not reshape failures"),
        );
        assert_eq!(failed["error"], "nope");

        let ok = map_envelope_data(
            serde_json::json!({"success": true, "data": {"id": "x"}}),
            |d| serde_json::json!({"id": d["id"], "extra": 1}),
        );
        assert_eq!(ok["data"]["extra"], 1);
    }

    #[test]
    fn compact_drops_nulls_from_objects() {
        let v = compact(serde_json::json!({"a": 1, "b": null, "c": "x"}));
        assert_eq!(v, serde_json::json!({"a": 1, "c": "x"}));
    }

    #[test]
    fn parse_params_reports_schema_struct_disagreement() {
        #[derive(Debug, serde::Deserialize)]
        struct P {
            #[allow(dead_code)]
            n: u64,
        }
        let err = parse_params::<P>(serde_json::json!({"n": "not a number"})).unwrap_err();
        assert!(err.to_string().contains("declared schema"));
    }
}
