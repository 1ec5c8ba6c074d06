#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Recording mock backend for dispatcher and bridge tests.
//!
//! [`MockToolset`] plays both spy and stub: every delegated call is recorded
//! (name + parameter bag) and answered with a scripted response, so tests can
//! assert that the backend was reached exactly as many times as expected —
//! including zero times for dispatch failures.

use anyhow::Result;
use async_trait::async_trait;
use atb_backend_core::{BackendIdentity, ToolBackend};
use atb_core::{RegistryError, ToolRegistry, ToolRegistryBuilder};
use schemars::JsonSchema;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// One delegated call, as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Tool name the dispatcher delegated.
    pub tool: String,
    /// The validated parameter bag, untouched.
    pub params: Value,
}

#[derive(Debug, Clone)]
enum Scripted {
    Respond(Value),
    Fail(String),
}

/// A scripted, recording [`ToolBackend`] for tests.
#[derive(Debug)]
pub struct MockToolset {
    registry: ToolRegistry,
    scripted: BTreeMap<String, Scripted>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockToolset {
    /// Start building a mock toolset.
    pub fn builder() -> MockToolsetBuilder {
        MockToolsetBuilder::default()
    }

    /// Everything delegated to this backend so far, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of delegations for one tool name.
    pub fn call_count(&self, tool: &str) -> usize {
        self.calls().iter().filter(|c| c.tool == tool).count()
    }
}

#[async_trait]
impl ToolBackend for MockToolset {
    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            id: "mock".to_string(),
            adapter_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                tool: name.to_string(),
                params: params.clone(),
            });
        }
        match self.scripted.get(name) {
            Some(Scripted::Respond(value)) => Ok(value.clone()),
            Some(Scripted::Fail(message)) => Err(anyhow::anyhow!("{message}")),
            None => Err(anyhow::anyhow!("no scripted response for tool: {name}")),
        }
    }
}

/// Builder for [`MockToolset`].
#[derive(Debug, Default)]
pub struct MockToolsetBuilder {
    registry: Option<ToolRegistryBuilder>,
    scripted: BTreeMap<String, Scripted>,
}

impl MockToolsetBuilder {
    /// Register a tool that answers with `response`.
    pub fn tool<P: JsonSchema>(
        mut self,
        name: &str,
        description: &str,
        response: Value,
    ) -> Result<Self, RegistryError> {
        let builder = self.registry.take().unwrap_or_default();
        self.registry = Some(builder.tool::<P>(name, description)?);
        self.scripted
            .insert(name.to_string(), Scripted::Respond(response));
        Ok(self)
    }

    /// Register a tool that fails with the given error message.
    pub fn failing_tool<P: JsonSchema>(
        mut self,
        name: &str,
        description: &str,
        message: &str,
    ) -> Result<Self, RegistryError> {
        let builder = self.registry.take().unwrap_or_default();
        self.registry = Some(builder.tool::<P>(name, description)?);
        self.scripted
            .insert(name.to_string(), Scripted::Fail(message.to_string()));
        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> MockToolset {
        MockToolset {
            registry: self.registry.unwrap_or_default().build(),
            scripted: self.scripted,
            calls: Mutex::new(Vec::new()),
        }
    }
}
