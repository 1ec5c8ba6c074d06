// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dispatch error taxonomy.

use atb_core::SchemaViolations;

/// Everything that can go wrong between a tool name arriving and a backend
/// result leaving.
///
/// None of these are retried by the runtime: an unknown name and a
/// validation failure are caller mistakes, and backend failures are
/// propagated verbatim for the caller to handle.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The requested name is absent from the registry.
    #[error("unknown tool: {name}")]
    UnknownTool {
        /// The offending name.
        name: String,
    },

    /// The parameter bag failed schema conformance. Carries per-field detail.
    #[error(transparent)]
    InvalidParameters(#[from] SchemaViolations),

    /// The vendor call failed; the adapter's error is preserved unchanged.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use atb_core::Violation;

    #[test]
    fn unknown_tool_names_the_offender() {
        let err = DispatchError::UnknownTool {
            name: "nonexistent_tool".into(),
        };
        assert_eq!(err.to_string(), "unknown tool: nonexistent_tool");
    }

    #[test]
    fn invalid_parameters_preserves_field_detail() {
        let err = DispatchError::from(SchemaViolations {
            violations: vec![Violation {
                path: "id".into(),
                message: "123 is not of type \"string\"".into(),
            }],
        });
        let text = err.to_string();
        assert!(text.contains("id"));
        assert!(text.contains("string"));
    }

    #[test]
    fn backend_errors_pass_through_unchanged() {
        let err = DispatchError::from(anyhow::anyhow!("Failed to create issue: HTTP 403"));
        assert_eq!(err.to_string(), "Failed to create issue: HTTP 403");
    }
}
