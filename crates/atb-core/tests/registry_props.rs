//! Property tests for the registry bijection invariant.

use atb_core::{ParameterSchema, ToolRegistry};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;

fn object_schema() -> ParameterSchema {
    ParameterSchema::from_value(json!({"type": "object", "properties": {}})).unwrap()
}

proptest! {
    /// For any set of unique names, every descriptor has exactly one schema
    /// entry and vice versa.
    #[test]
    fn bijection_holds_for_arbitrary_names(
        names in prop::collection::btree_set("[a-z][a-z0-9_]{0,15}", 0..24)
    ) {
        let mut builder = ToolRegistry::builder();
        for name in &names {
            builder = builder
                .tool_with_schema(name.clone(), "generated", object_schema())
                .unwrap();
        }
        let registry = builder.build();

        let descriptor_names: BTreeSet<String> =
            registry.tools().iter().map(|t| t.name.clone()).collect();
        let schema_names: BTreeSet<String> = registry.schemas().keys().cloned().collect();

        prop_assert_eq!(&descriptor_names, &names);
        prop_assert_eq!(&schema_names, &names);
        prop_assert_eq!(registry.len(), names.len());
    }

    /// Registering the same name twice always fails, whatever the name.
    #[test]
    fn duplicates_always_rejected(name in "[a-z][a-z0-9_]{0,15}") {
        let result = ToolRegistry::builder()
            .tool_with_schema(name.clone(), "first", object_schema())
            .unwrap()
            .tool_with_schema(name, "second", object_schema());
        prop_assert!(result.is_err());
    }
}
