//! Tool dispatch: resolve each request against the registry, run it, and
//! normalize the outcome into a [`ToolInvocationResult`].

use super::registry::ToolRegistry;
use crate::types::{FailureKind, ToolInvocationRequest, ToolInvocationResult};
use tracing::{info, warn};

/// Execute one tool call. Never fails: every error becomes a failed result.
pub async fn dispatch(registry: &ToolRegistry, request: &ToolInvocationRequest) -> ToolInvocationResult {
    let tool = match registry.lookup(&request.name) {
        Ok(tool) => tool,
        Err(_) => {
            warn!("Model requested unknown tool '{}'", request.name);
            return ToolInvocationResult::failed(&request.name, FailureKind::ToolNotFound, &request.name);
        }
    };

    info!("Tool: {}({})", request.name, serde_json::Value::Object(request.arguments.clone()));

    // Run on its own task so a panicking handler is contained like any other failure.
    let handler = tool.handler.clone();
    let args = request.arguments.clone();
    let outcome = tokio::spawn(async move { handler.call(&args).await }).await;

    match outcome {
        Ok(Ok(payload)) => ToolInvocationResult::ok(&request.name, payload),
        Ok(Err(e)) => {
            warn!("Tool '{}' failed: {}", request.name, e);
            ToolInvocationResult::failed(&request.name, e.kind(), e)
        }
        Err(join_err) => {
            warn!("Tool '{}' aborted: {}", request.name, join_err);
            ToolInvocationResult::failed(&request.name, FailureKind::HandlerError, "tool handler panicked")
        }
    }
}

/// Execute requests in order. A failed request does not stop later ones.
pub async fn dispatch_all(
    registry: &ToolRegistry,
    requests: &[ToolInvocationRequest],
) -> Vec<ToolInvocationResult> {
    let mut results = Vec::with_capacity(requests.len());
    for request in requests {
        results.push(dispatch(registry, request).await);
    }
    results
}
