#![deny(unsafe_code)]
#![warn(missing_docs)]
//! openai-bridge
//!
//! Projects a dispatcher's registry into the OpenAI function-calling shape:
//! one [`FunctionTool`] per descriptor, keyed by name, each bundling the
//! description, the `parameters` JSON Schema, and a bound executor that
//! round-trips to `execute_function(name, args)`.
//!
//! This is a pure, one-time transform. The only errors a bound executor can
//! produce are the ones the dispatcher raises.

use atb_runtime::{Dispatch, DispatchError};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One callable entry in an OpenAI-style function table.
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
    dispatcher: Arc<dyn Dispatch>,
}

impl FunctionTool {
    /// The tool's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description advertised to the model.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The `parameters` JSON Schema.
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// The wire-shaped declaration sent to the API:
    /// `{"type": "function", "function": {name, description, parameters}}`.
    pub fn declaration(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            },
        })
    }

    /// Execute the bound tool with the model-supplied arguments.
    pub async fn call(&self, args: Value) -> Result<Value, DispatchError> {
        self.dispatcher.execute_function(&self.name, args).await
    }
}

impl fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Build the callable function table: one entry per descriptor, keyed by
/// name.
pub fn function_table(dispatcher: Arc<dyn Dispatch>) -> BTreeMap<String, FunctionTool> {
    dispatcher
        .descriptors()
        .iter()
        .map(|d| {
            (
                d.name.clone(),
                FunctionTool {
                    name: d.name.clone(),
                    description: d.description.clone(),
                    parameters: d.parameters.clone(),
                    dispatcher: Arc::clone(&dispatcher),
                },
            )
        })
        .collect()
}

/// The declaration list for a request payload, in registry order.
pub fn function_declarations(dispatcher: &dyn Dispatch) -> Vec<Value> {
    dispatcher
        .descriptors()
        .iter()
        .map(|d| {
            json!({
                "type": "function",
                "function": {
                    "name": d.name,
                    "description": d.description,
                    "parameters": d.parameters,
                },
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
    struct GetUserParams {
        /// User identifier.
        #[serde(default)]
        id: Option<String>,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct SearchParams {
        /// Search query.
        query: String,
    }

    fn dispatcher() -> Arc<dyn Dispatch> {
        let mock = MockToolset::builder()
            .tool::<GetUserParams>("get_user", "Fetch a user", json!({"id": "u_1"}))
            .unwrap()
            .tool::<SearchParams>("search", "Search things", json!({"hits": []}))
            .unwrap()
            .build();
        Arc::new(Dispatcher::new(mock))
    }

    #[test]
    fn table_has_one_entry_per_descriptor() {
        let d = dispatcher();
        let table = function_table(Arc::clone(&d));
        assert_eq!(table.len(), d.descriptors().len());
        assert!(table.contains_key("get_user"));
        assert!(table.contains_key("search"));
    }

    #[test]
    fn declaration_wire_shape() {
        let d = dispatcher();
        let table = function_table(d);
        let decl = table["get_user"].declaration();
        assert_eq!(decl["type"], "function");
        assert_eq!(decl["function"]["name"], "get_user");
        assert_eq!(decl["function"]["description"], "Fetch a user");
        assert_eq!(decl["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn declarations_follow_registry_order() {
        let d = dispatcher();
        let decls = function_declarations(d.as_ref());
        let names: Vec<&str> = decls
            .iter()
            .map(|v| v["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["get_user", "search"]);
    }

    #[tokio::test]
    async fn bound_executor_round_trips_to_dispatch() {
        let d = dispatcher();
        let table = function_table(d);
        let result = table["get_user"].call(json!({"id": "u_9"})).await.unwrap();
        assert_eq!(result, json!({"id": "u_1"}));
    }

    #[tokio::test]
    async fn bound_executor_propagates_validation_errors() {
        let d = dispatcher();
        let table = function_table(d);
        let err = table["search"].call(json!({})).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParameters(_)));
    }
}
