#![deny(unsafe_code)]
#![warn(missing_docs)]
//! anthropic-bridge
//!
//! Projects a dispatcher's registry into the Anthropic tool-use shape. The
//! internal fields are the same as the OpenAI variant; the wire difference is
//! the top-level schema key: `input_schema` instead of `parameters`. Both
//! shapes are produced from the one registry, so they can never disagree.

use atb_runtime::{Dispatch, DispatchError};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One callable entry in an Anthropic-style tool table.
#[derive(Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    input_schema: Value,
    dispatcher: Arc<dyn Dispatch>,
}

impl ToolSpec {
    /// The tool's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description advertised to the model.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The `input_schema` JSON Schema.
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// The wire-shaped descriptor: `{name, description, input_schema}`.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }

    /// Execute the bound tool with the model-supplied input.
    pub async fn call(&self, input: Value) -> Result<Value, DispatchError> {
        self.dispatcher.execute_function(&self.name, input).await
    }
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Build the callable tool table: one entry per descriptor, keyed by name.
pub fn tool_table(dispatcher: Arc<dyn Dispatch>) -> BTreeMap<String, ToolSpec> {
    dispatcher
        .descriptors()
        .iter()
        .map(|d| {
            (
                d.name.clone(),
                ToolSpec {
                    name: d.name.clone(),
                    description: d.description.clone(),
                    input_schema: d.parameters.clone(),
                    dispatcher: Arc::clone(&dispatcher),
                },
            )
        })
        .collect()
}

/// The descriptor list for a request payload, in registry order.
pub fn tool_descriptors(dispatcher: &dyn Dispatch) -> Vec<Value> {
    dispatcher
        .descriptors()
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "description": d.description,
                "input_schema": d.parameters,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atb_backend_mock::MockToolset;
    use atb_runtime::Dispatcher;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct ScrapeParams {
        /// URL to scrape.
        url: String,
    }

    fn dispatcher() -> Arc<dyn Dispatch> {
        let mock = MockToolset::builder()
            .tool::<ScrapeParams>("scrape_url", "Scrape a page", json!({"markdown": "# hi"}))
            .unwrap()
            .build();
        Arc::new(Dispatcher::new(mock))
    }

    #[test]
    fn descriptor_uses_input_schema_key() {
        let d = dispatcher();
        let specs = tool_descriptors(d.as_ref());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0]["name"], "scrape_url");
        assert!(specs[0].get("input_schema").is_some());
        assert!(specs[0].get("parameters").is_none());
        assert_eq!(specs[0]["input_schema"]["type"], "object");
    }

    #[test]
    fn both_wire_shapes_come_from_one_registry() {
        let d = dispatcher();
        let table = tool_table(Arc::clone(&d));
        let spec = &table["scrape_url"];
        assert_eq!(spec.input_schema(), &d.descriptors()[0].parameters);
    }

    #[tokio::test]
    async fn bound_executor_round_trips_to_dispatch() {
        let d = dispatcher();
        let table = tool_table(d);
        let result = table["scrape_url"]
            .call(json!({"url": "https://example.com"}))
            .await
            .unwrap();
        assert_eq!(result, json!({"markdown": "# hi"}));
    }

    #[tokio::test]
    async fn unknown_names_still_fail_through_the_dispatcher() {
        let d = dispatcher();
        let table = tool_table(Arc::clone(&d));
        // The table itself only contains registered names; going through the
        // dispatcher directly with a bogus name is the failure path.
        assert!(table.get("nonexistent_tool").is_none());
        let err = d
            .execute_function("nonexistent_tool", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool { .. }));
    }
}
