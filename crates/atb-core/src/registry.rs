// SPDX-License-Identifier: MIT OR Apache-2.0
//! The tool registry: descriptors and validators kept in lockstep.

use crate::descriptor::ToolDescriptor;
use crate::schema::{ParameterSchema, SchemaError};
use schemars::JsonSchema;
use std::collections::BTreeMap;

/// Errors raised while assembling a [`ToolRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two tools were registered under the same name.
    #[error("duplicate tool name: {name}")]
    DuplicateTool {
        /// The name registered twice.
        name: String,
    },

    /// A parameter schema could not be generated or compiled.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// An ordered collection of [`ToolDescriptor`]s plus the co-indexed validator
/// map.
///
/// Every descriptor's name has exactly one validator entry and vice versa.
/// The builder registers both halves as a single unit, so the bijection holds
/// by construction; a duplicate name is rejected at registration time.
///
/// Registries are built once at adapter construction and never mutated.
/// Accessors are pure reads, safe to share across concurrent dispatches.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    schemas: BTreeMap<String, ParameterSchema>,
}

impl ToolRegistry {
    /// Start building a registry.
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// The full descriptor list, in declaration order.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// The validator map, keyed by tool name.
    pub fn schemas(&self) -> &BTreeMap<String, ParameterSchema> {
        &self.schemas
    }

    /// Look up the validator for a tool name.
    pub fn schema(&self, name: &str) -> Option<&ParameterSchema> {
        self.schemas.get(name)
    }

    /// Look up the descriptor for a tool name.
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder for [`ToolRegistry`].
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<ToolDescriptor>,
    schemas: BTreeMap<String, ParameterSchema>,
}

impl ToolRegistryBuilder {
    /// Register a tool whose parameter schema is generated from `P`.
    ///
    /// The descriptor's advertised `parameters` document and the runtime
    /// validator are the same generated schema — a single source of truth.
    pub fn tool<P: JsonSchema>(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let schema = ParameterSchema::of::<P>()?;
        self.tool_with_schema(name, description, schema)
    }

    /// Register a tool with an explicitly constructed schema.
    pub fn tool_with_schema(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParameterSchema,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(RegistryError::DuplicateTool { name });
        }
        self.tools.push(ToolDescriptor::new(
            name.clone(),
            description,
            schema.as_json().clone(),
        ));
        self.schemas.insert(name, schema);
        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: self.tools,
            schemas: self.schemas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeSet;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct EchoParams {
        /// Text to echo back.
        message: String,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EmptyParams {}

    fn sample() -> ToolRegistry {
        ToolRegistry::builder()
            .tool::<EchoParams>("echo", "Echo a message")
            .unwrap()
            .tool::<EmptyParams>("ping", "Check liveness")
            .unwrap()
            .build()
    }

    #[test]
    fn descriptor_names_and_schema_keys_are_in_bijection() {
        let registry = sample();
        let from_tools: BTreeSet<&str> =
            registry.tools().iter().map(|t| t.name.as_str()).collect();
        let from_schemas: BTreeSet<&str> =
            registry.schemas().keys().map(String::as_str).collect();
        assert_eq!(from_tools, from_schemas);
        assert_eq!(registry.tools().len(), registry.schemas().len());
    }

    #[test]
    fn declaration_order_is_preserved() {
        let registry = sample();
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "ping"]);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let result = ToolRegistry::builder()
            .tool::<EchoParams>("echo", "first")
            .unwrap()
            .tool::<EmptyParams>("echo", "second");
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateTool { name }) if name == "echo"
        ));
    }

    #[test]
    fn descriptor_parameters_match_the_validator_document() {
        let registry = sample();
        let descriptor = registry.descriptor("echo").unwrap();
        let schema = registry.schema("echo").unwrap();
        assert_eq!(&descriptor.parameters, schema.as_json());
    }

    #[test]
    fn tools_is_idempotent() {
        let registry = sample();
        let first: Vec<ToolDescriptor> = registry.tools().to_vec();
        let second: Vec<ToolDescriptor> = registry.tools().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn lookup_misses_return_none() {
        let registry = sample();
        assert!(registry.schema("nope").is_none());
        assert!(registry.descriptor("nope").is_none());
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn empty_registry() {
        let registry = ToolRegistry::builder().build();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
