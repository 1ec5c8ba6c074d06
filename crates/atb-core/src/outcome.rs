// SPDX-License-Identifier: MIT OR Apache-2.0
//! The explicit success/error envelope used by envelope-convention adapters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An explicit `{success, data?, error?}` result envelope.
///
/// Two failure-reporting conventions coexist across adapters: most raise an
/// error whose message reads `"Failed to <operation>: <cause>"`, while some
/// (e.g. the Resend, Twilio, and Firecrawl toolsets) return this envelope as
/// a success value and never raise for vendor-side rejections. Callers must
/// be prepared for either, per adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    /// Whether the vendor call succeeded.
    pub success: bool,

    /// The reshaped vendor response, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// The failure cause, present on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallOutcome {
    /// A successful outcome carrying reshaped response data.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed outcome carrying the vendor's rejection cause.
    pub fn err(cause: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(cause.into()),
        }
    }
}

impl From<CallOutcome> for Value {
    fn from(outcome: CallOutcome) -> Self {
        let mut map = serde_json::Map::new();
        map.insert("success".into(), Value::Bool(outcome.success));
        if let Some(data) = outcome.data {
            map.insert("data".into(), data);
        }
        if let Some(error) = outcome.error {
            map.insert("error".into(), Value::String(error));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_envelope_shape() {
        let v: Value = CallOutcome::ok(json!({"id": "em_1"})).into();
        assert_eq!(v["success"], true);
        assert_eq!(v["data"]["id"], "em_1");
        assert!(v.get("error").is_none());
    }

    #[test]
    fn err_envelope_shape() {
        let v: Value = CallOutcome::err("invalid recipient").into();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "invalid recipient");
        assert!(v.get("data").is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let outcome = CallOutcome::err("nope");
        let text = serde_json::to_string(&outcome).unwrap();
        let back: CallOutcome = serde_json::from_str(&text).unwrap();
        assert_eq!(back, outcome);
    }
}
