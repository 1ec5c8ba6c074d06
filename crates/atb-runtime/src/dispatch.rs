// SPDX-License-Identifier: MIT OR Apache-2.0
//! The dispatcher: look up, validate, delegate, return verbatim.

use crate::error::DispatchError;
use async_trait::async_trait;
use atb_backend_core::ToolBackend;
use atb_core::{ToolDescriptor, ToolRegistry};
use atb_telemetry::{CallMetrics, MetricsCollector};
use chrono::Utc;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The single entry point for all tool invocation.
///
/// Wraps one [`ToolBackend`] and its registry. Each call is independent and
/// stateless: look up the validator by name, validate the raw parameters,
/// delegate to the backend, and hand the result back without interpreting
/// it. Attach a [`MetricsCollector`] to record per-call telemetry; recording
/// never alters a result.
pub struct Dispatcher<B> {
    backend: B,
    collector: Option<MetricsCollector>,
}

impl<B: ToolBackend> Dispatcher<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            collector: None,
        }
    }

    /// Attach a metrics collector.
    #[must_use]
    pub fn with_collector(mut self, collector: MetricsCollector) -> Self {
        self.collector = Some(collector);
        self
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend's tool registry.
    pub fn registry(&self) -> &ToolRegistry {
        self.backend.registry()
    }

    /// Validate `params` against the schema registered for `name`, then
    /// execute.
    ///
    /// Fails with [`DispatchError::UnknownTool`] for unregistered names and
    /// [`DispatchError::InvalidParameters`] for nonconformant bags — in both
    /// cases the backend is never invoked. On success the backend's result
    /// is returned unchanged.
    pub async fn execute_function(
        &self,
        name: &str,
        params: Value,
    ) -> Result<Value, DispatchError> {
        let schema =
            self.registry()
                .schema(name)
                .ok_or_else(|| DispatchError::UnknownTool {
                    name: name.to_string(),
                })?;
        schema.validate(&params)?;
        debug!(tool = name, "parameters validated, delegating to backend");

        let started = Instant::now();
        let result = self.backend.call(name, params).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        if let Some(collector) = &self.collector {
            collector.record(CallMetrics {
                vendor: self.backend.identity().id,
                tool: name.to_string(),
                duration_ms,
                ok: result.is_ok(),
                recorded_at: Utc::now(),
            });
        }

        match &result {
            Ok(_) => info!(tool = name, duration_ms, "tool call completed"),
            Err(e) => warn!(tool = name, duration_ms, error = %e, "tool call failed"),
        }

        result.map_err(DispatchError::from)
    }
}

/// Object-safe dispatch surface consumed by the framework bridges.
///
/// A bridge only needs the descriptor list and the ability to execute by
/// name; it should not care which backend sits underneath.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// The descriptors of every dispatchable tool, in declaration order.
    fn descriptors(&self) -> &[ToolDescriptor];

    /// Validate and execute, as [`Dispatcher::execute_function`].
    async fn execute_function(&self, name: &str, params: Value) -> Result<Value, DispatchError>;
}

#[async_trait]
impl<B: ToolBackend> Dispatch for Dispatcher<B> {
    fn descriptors(&self) -> &[ToolDescriptor] {
        self.registry().tools()
    }

    async fn execute_function(&self, name: &str, params: Value) -> Result<Value, DispatchError> {
        Dispatcher::execute_function(self, name, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atb_backend_mock::MockToolset;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct GetUserParams {
        /// User identifier.
        #[serde(default)]
        id: Option<String>,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct CreateNoteParams {
        /// Note title.
        title: String,
    }

    fn toolset() -> MockToolset {
        MockToolset::builder()
            .tool::<GetUserParams>("get_user", "Fetch a user", json!({"id": "u_1"}))
            .unwrap()
            .tool::<CreateNoteParams>("create_note", "Create a note", json!({"ok": true}))
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn unknown_tool_fails_without_reaching_backend() {
        let backend = toolset();
        let dispatcher = Dispatcher::new(backend);
        let err = dispatcher
            .execute_function("nonexistent_tool", json!({}))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DispatchError::UnknownTool { ref name } if name == "nonexistent_tool")
        );
        assert_eq!(dispatcher.backend().calls().len(), 0);
    }

    #[tokio::test]
    async fn missing_required_field_fails_before_backend() {
        let dispatcher = Dispatcher::new(toolset());
        let err = dispatcher
            .execute_function("create_note", json!({}))
            .await
            .unwrap_err();
        match err {
            DispatchError::InvalidParameters(v) => {
                assert!(v.violations.iter().any(|v| v.path == "title"));
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
        assert_eq!(dispatcher.backend().calls().len(), 0);
    }

    #[tokio::test]
    async fn wrong_type_names_the_field() {
        let dispatcher = Dispatcher::new(toolset());
        let err = dispatcher
            .execute_function("get_user", json!({"id": 123}))
            .await
            .unwrap_err();
        match err {
            DispatchError::InvalidParameters(v) => {
                assert_eq!(v.violations[0].path, "id");
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conformant_call_reaches_backend_exactly_once() {
        let dispatcher = Dispatcher::new(toolset());
        let result = dispatcher
            .execute_function("get_user", json!({"id": "u_42"}))
            .await
            .unwrap();
        assert_eq!(result, json!({"id": "u_1"}));

        let calls = dispatcher.backend().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool, "get_user");
        assert_eq!(calls[0].params, json!({"id": "u_42"}));
    }

    #[tokio::test]
    async fn optional_field_may_be_omitted() {
        let dispatcher = Dispatcher::new(toolset());
        dispatcher.execute_function("get_user", json!({})).await.unwrap();
        assert_eq!(dispatcher.backend().calls()[0].params, json!({}));
    }

    #[tokio::test]
    async fn backend_error_is_returned_verbatim() {
        let backend = MockToolset::builder()
            .failing_tool::<GetUserParams>("get_user", "Fetch a user", "Failed to fetch user: HTTP 500")
            .unwrap()
            .build();
        let dispatcher = Dispatcher::new(backend);
        let err = dispatcher
            .execute_function("get_user", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch user: HTTP 500");
        assert_eq!(dispatcher.backend().calls().len(), 1);
    }

    #[tokio::test]
    async fn telemetry_records_without_changing_results() {
        let collector = MetricsCollector::new();
        let dispatcher = Dispatcher::new(toolset()).with_collector(collector.clone());

        dispatcher
            .execute_function("get_user", json!({}))
            .await
            .unwrap();
        dispatcher
            .execute_function("nonexistent_tool", json!({}))
            .await
            .unwrap_err();

        // only calls that reach the backend are recorded
        assert_eq!(collector.len(), 1);
        let calls = collector.calls();
        assert_eq!(calls[0].vendor, "mock");
        assert_eq!(calls[0].tool, "get_user");
        assert!(calls[0].ok);
    }

    #[tokio::test]
    async fn usable_as_a_trait_object() {
        let dispatcher: Arc<dyn Dispatch> = Arc::new(Dispatcher::new(toolset()));
        assert_eq!(dispatcher.descriptors().len(), 2);
        let result = dispatcher
            .execute_function("get_user", json!({}))
            .await
            .unwrap();
        assert_eq!(result, json!({"id": "u_1"}));
    }

    #[tokio::test]
    async fn concurrent_dispatches_are_independent() {
        let dispatcher = Arc::new(Dispatcher::new(toolset()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let d = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                d.execute_function("get_user", json!({})).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(dispatcher.backend().calls().len(), 8);
    }
}
