// SPDX-License-Identifier: MIT OR Apache-2.0
//! The static tool descriptor advertised to LLM callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, schema-described operation an AI orchestration layer may invoke.
///
/// Descriptors are plain data: no behavior, constructed once, immutable
/// thereafter. The `parameters` field is a JSON Schema object
/// (`type: "object"`, `properties`, optional `required`) and is generated from
/// the same typed struct the runtime validator checks against, so the
/// advertised shape can never drift from what execution accepts.
///
/// The serialized form `{name, description, parameters}` is consumed as-is by
/// LLM providers and must round-trip through JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique, stable identifier within a registry.
    pub name: String,

    /// Human-readable description shown to the model.
    pub description: String,

    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Create a descriptor from its three parts.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_expected_keys() {
        let d = ToolDescriptor::new(
            "get_user",
            "Fetch a user by id",
            json!({"type": "object", "properties": {"id": {"type": "string"}}}),
        );
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["name"], "get_user");
        assert_eq!(v["description"], "Fetch a user by id");
        assert_eq!(v["parameters"]["type"], "object");
    }

    #[test]
    fn json_roundtrip_preserves_structure() {
        let d = ToolDescriptor::new(
            "send_email",
            "Send an email",
            json!({
                "type": "object",
                "properties": {"to": {"type": "string"}, "subject": {"type": "string"}},
                "required": ["to"],
            }),
        );
        let text = serde_json::to_string(&d).unwrap();
        let back: ToolDescriptor = serde_json::from_str(&text).unwrap();
        assert_eq!(back, d);
    }
}
