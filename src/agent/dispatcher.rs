//! Tool dispatcher
//!
//! Turns requested tool calls into `ToolInvocationResult`s. Every failure a
//! tool can produce (unknown name, bad arguments, timeout, provider error) is
//! converted into a failure result here so it can go back to the model.

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::{FailureKind, ToolCall, ToolInvocationResult};
use crate::tools::schema::strip_nulls;
use crate::tools::{ToolError, ToolRegistry};

/// Executes tool calls against the registry
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute a single tool call
    pub async fn execute(&self, tool_name: &str, arguments: Value) -> ToolInvocationResult {
        let spec = match self.registry.lookup(tool_name) {
            Ok(spec) => spec,
            Err(_) => {
                warn!(tool = tool_name, "model requested an unknown tool");
                return ToolInvocationResult::failure(
                    FailureKind::UnknownTool,
                    format!(
                        "Unknown tool '{}'. Available tools: {}",
                        tool_name,
                        self.registry.names().join(", ")
                    ),
                );
            }
        };

        let arguments = strip_nulls(arguments);
        if let Err(message) = spec.schema().validate(&arguments) {
            debug!(tool = tool_name, %message, "arguments rejected by schema");
            return ToolInvocationResult::failure(FailureKind::InvalidArguments, message);
        }

        let handler = spec.handler();
        match tokio::time::timeout(self.timeout, handler.call(arguments)).await {
            Ok(Ok(mut payload)) => {
                payload.sort_by_price();
                info!(tool = tool_name, offers = payload.offers().len(), "tool succeeded");
                ToolInvocationResult::Success(payload)
            }
            Ok(Err(ToolError::InvalidArguments(message))) => {
                debug!(tool = tool_name, %message, "tool rejected arguments");
                ToolInvocationResult::failure(FailureKind::InvalidArguments, message)
            }
            Ok(Err(ToolError::Execution(message))) => {
                warn!(tool = tool_name, %message, "tool execution failed");
                ToolInvocationResult::failure(FailureKind::ExecutionFailed, message)
            }
            Err(_) => {
                warn!(tool = tool_name, timeout = ?self.timeout, "tool timed out");
                ToolInvocationResult::failure(
                    FailureKind::ExecutionFailed,
                    format!("{} timed out after {:?}", tool_name, self.timeout),
                )
            }
        }
    }

    /// Execute a batch of independent calls concurrently
    ///
    /// Results come back in the same order as `calls`.
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolInvocationResult> {
        join_all(
            calls
                .iter()
                .map(|call| self.execute(&call.name, call.arguments.clone())),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Offer, ToolPayload};
    use crate::tools::schema::{ArgSchema, ParamType};
    use crate::tools::{ToolHandler, ToolSpec};
    use async_trait::async_trait;
    use serde_json::json;

    struct Prices(Vec<f64>);

    #[async_trait]
    impl ToolHandler for Prices {
        async fn call(&self, _args: Value) -> Result<ToolPayload, ToolError> {
            Ok(ToolPayload::Flights(
                self.0
                    .iter()
                    .map(|p| Offer {
                        provider: format!("Air {}", p),
                        price: *p,
                        currency: "USD".into(),
                        description: String::new(),
                        link: None,
                        logo: None,
                    })
                    .collect(),
            ))
        }
    }

    struct Sleepy;

    #[async_trait]
    impl ToolHandler for Sleepy {
        async fn call(&self, _args: Value) -> Result<ToolPayload, ToolError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ToolPayload::Hotels(vec![]))
        }
    }

    fn dispatcher() -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolSpec::new(
                "prices",
                "fixed prices",
                ArgSchema::new().required("route", ParamType::String, "route"),
                Arc::new(Prices(vec![300.0, 120.0, 250.0])),
            ))
            .unwrap();
        registry
            .register(ToolSpec::new(
                "sleepy",
                "never answers in time",
                ArgSchema::new(),
                Arc::new(Sleepy),
            ))
            .unwrap();
        ToolDispatcher::new(Arc::new(registry), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_result() {
        let result = dispatcher().execute("car_rental", json!({})).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::UnknownTool));
        assert!(result.to_content().contains("prices"));
    }

    #[tokio::test]
    async fn test_schema_violation() {
        let result = dispatcher().execute("prices", json!({"route": 7})).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));

        let result = dispatcher().execute("prices", json!("JFK-LAX")).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));
    }

    #[tokio::test]
    async fn test_success_sorted_by_price() {
        let result = dispatcher().execute("prices", json!({"route": "JFK-LAX"})).await;
        match result {
            ToolInvocationResult::Success(payload) => {
                let prices: Vec<f64> = payload.offers().iter().map(|o| o.price).collect();
                assert_eq!(prices, vec![120.0, 250.0, 300.0]);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_execution_failure() {
        let result = dispatcher().execute("sleepy", Value::Null).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::ExecutionFailed));
        assert!(result.to_content().contains("timed out"));
    }

    #[tokio::test]
    async fn test_dispatch_all_keeps_order() {
        let calls = vec![
            ToolCall::new("1", "sleepy", json!({})),
            ToolCall::new("2", "prices", json!({"route": "JFK-LAX"})),
            ToolCall::new("3", "nope", json!({})),
        ];
        let results = dispatcher().dispatch_all(&calls).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].failure_kind(), Some(FailureKind::ExecutionFailed));
        assert!(results[1].is_success());
        assert_eq!(results[2].failure_kind(), Some(FailureKind::UnknownTool));
    }

    #[tokio::test]
    async fn test_dispatch_is_repeatable() {
        let d = dispatcher();
        let first = d.execute("prices", json!({"route": "JFK-LAX"})).await;
        let second = d.execute("prices", json!({"route": "JFK-LAX"})).await;
        assert_eq!(first, second);
    }
}
