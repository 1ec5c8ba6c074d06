// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter schema generation and runtime validation.
//!
//! A [`ParameterSchema`] is built once from a typed parameter struct via
//! `schemars` and compiled with `jsonschema` for runtime checks. The same
//! generated document is what a [`crate::ToolDescriptor`] advertises, so the
//! shape an LLM sees and the shape the dispatcher enforces cannot drift.

use jsonschema::error::ValidationErrorKind;
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building a [`ParameterSchema`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The generated document could not be serialized to JSON.
    #[error("failed to generate parameter schema: {reason}")]
    Generate {
        /// Human-readable detail.
        reason: String,
    },

    /// The schema document is not a valid JSON Schema.
    #[error("failed to compile parameter schema: {reason}")]
    Compile {
        /// Human-readable detail.
        reason: String,
    },
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field; `(root)` for document-level
    /// failures that do not point at a property.
    pub path: String,
    /// What was wrong with it.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Structured validation error enumerating every offending field.
///
/// Errors are accumulated, not short-circuited, so a caller sees the full
/// list of problems in one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolations {
    /// All failures found in the parameter bag.
    pub violations: Vec<Violation>,
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameters failed validation: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolations {}

// ---------------------------------------------------------------------------
// ParameterSchema
// ---------------------------------------------------------------------------

/// A runtime validator plus the JSON Schema document it was compiled from.
///
/// Constructed once per tool at adapter initialization and immutable
/// thereafter. Validation is read-only, so a schema may be shared across
/// arbitrarily many concurrent dispatches.
pub struct ParameterSchema {
    schema: Value,
    compiled: jsonschema::Validator,
}

impl ParameterSchema {
    /// Generate a schema from a typed parameter struct.
    ///
    /// Subschemas are inlined so the document is self-contained (`$ref`-free),
    /// which is what LLM providers expect. Doc comments on the struct's
    /// fields become property descriptions.
    pub fn of<P: JsonSchema>() -> Result<Self, SchemaError> {
        let generator = SchemaSettings::default()
            .with(|s| s.inline_subschemas = true)
            .into_generator();
        let root = generator.into_root_schema_for::<P>();
        let mut schema = serde_json::to_value(root).map_err(|e| SchemaError::Generate {
            reason: e.to_string(),
        })?;
        // Meta keys are generator noise as far as tool callers are concerned.
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        Self::from_value(schema)
    }

    /// Compile a schema from an existing JSON Schema document.
    pub fn from_value(schema: Value) -> Result<Self, SchemaError> {
        let compiled = jsonschema::validator_for(&schema).map_err(|e| SchemaError::Compile {
            reason: e.to_string(),
        })?;
        Ok(Self { schema, compiled })
    }

    /// The JSON Schema document this validator was compiled from.
    pub fn as_json(&self) -> &Value {
        &self.schema
    }

    /// Validate a raw parameter bag against the schema.
    ///
    /// Returns every violation found, each carrying the offending field's
    /// path. Required-property failures are reported under the missing
    /// property's name rather than the document root.
    pub fn validate(&self, params: &Value) -> Result<(), SchemaViolations> {
        let violations: Vec<Violation> = self
            .compiled
            .iter_errors(params)
            .map(|err| {
                let path = match &err.kind {
                    ValidationErrorKind::Required { property } => property
                        .as_str()
                        .map(str::to_owned)
                        .unwrap_or_else(|| property.to_string()),
                    _ => pointer_to_path(&err.instance_path.to_string()),
                };
                Violation {
                    path,
                    message: err.to_string(),
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaViolations { violations })
        }
    }
}

impl fmt::Debug for ParameterSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// `/a/0/b` -> `a.0.b`; empty pointer -> `(root)`.
fn pointer_to_path(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        "(root)".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct GetUserParams {
        /// User identifier.
        #[serde(default)]
        id: Option<String>,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct SendEmailParams {
        /// Recipient address.
        to: String,
        /// Message subject.
        subject: String,
        /// Plain-text body.
        #[serde(default)]
        text: Option<String>,
    }

    #[test]
    fn generated_schema_is_an_object_schema() {
        let schema = ParameterSchema::of::<SendEmailParams>().unwrap();
        let json = schema.as_json();
        assert_eq!(json["type"], "object");
        assert!(json["properties"]["to"].is_object());
        assert!(json["properties"]["subject"].is_object());
        assert!(json.get("$schema").is_none());
        assert!(json.get("title").is_none());
    }

    #[test]
    fn required_lists_only_mandatory_fields() {
        let schema = ParameterSchema::of::<SendEmailParams>().unwrap();
        let required = schema.as_json()["required"].as_array().unwrap();
        let names: Vec<&str> = required.iter().filter_map(Value::as_str).collect();
        assert!(names.contains(&"to"));
        assert!(names.contains(&"subject"));
        assert!(!names.contains(&"text"));
    }

    #[test]
    fn field_docs_become_descriptions() {
        let schema = ParameterSchema::of::<SendEmailParams>().unwrap();
        assert_eq!(
            schema.as_json()["properties"]["to"]["description"],
            "Recipient address."
        );
    }

    #[test]
    fn conformant_params_pass() {
        let schema = ParameterSchema::of::<SendEmailParams>().unwrap();
        let params = json!({"to": "a@b.c", "subject": "hi", "text": "hello"});
        assert!(schema.validate(&params).is_ok());
    }

    #[test]
    fn empty_bag_passes_when_all_fields_optional() {
        let schema = ParameterSchema::of::<GetUserParams>().unwrap();
        assert!(schema.validate(&json!({})).is_ok());
    }

    #[test]
    fn missing_required_field_is_named() {
        let schema = ParameterSchema::of::<SendEmailParams>().unwrap();
        let err = schema.validate(&json!({"to": "a@b.c"})).unwrap_err();
        assert!(err.violations.iter().any(|v| v.path == "subject"));
    }

    #[test]
    fn wrong_type_names_the_offending_field() {
        let schema = ParameterSchema::of::<GetUserParams>().unwrap();
        let err = schema.validate(&json!({"id": 123})).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "id");
    }

    #[test]
    fn violations_accumulate() {
        let schema = ParameterSchema::of::<SendEmailParams>().unwrap();
        let err = schema.validate(&json!({"text": 5})).unwrap_err();
        // two missing required fields plus one type error
        assert!(err.violations.len() >= 3);
    }

    #[test]
    fn display_lists_every_violation() {
        let schema = ParameterSchema::of::<SendEmailParams>().unwrap();
        let err = schema.validate(&json!({})).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("parameters failed validation"));
        assert!(text.contains("to"));
        assert!(text.contains("subject"));
    }

    #[test]
    fn invalid_document_fails_to_compile() {
        let result = ParameterSchema::from_value(json!({"type": "no-such-type"}));
        assert!(matches!(result, Err(SchemaError::Compile { .. })));
    }
}
