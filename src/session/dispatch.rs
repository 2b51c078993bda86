use crate::tools::ToolHandler;
use crate::types::{ToolCallOutput, ToolCallRequest};
use anyhow::{anyhow, Context, Result};
use futures::future::try_join_all;
use std::time::Duration;

/// Run every pending tool call concurrently and pair each output with the id
/// of the call that produced it.
///
/// All-or-nothing: the first handler error (or timeout) drops the calls still
/// in flight and no outputs are returned.
pub async fn dispatch_tool_calls(
    handler: &dyn ToolHandler,
    tool_calls: &[ToolCallRequest],
    tool_timeout: Duration,
) -> Result<Vec<ToolCallOutput>> {
    let calls = tool_calls.iter().map(|request| async move {
        tracing::debug!(tool = %request.name, id = %request.id, "dispatching tool call");
        let output = tokio::time::timeout(tool_timeout, handler.call(request))
            .await
            .map_err(|_| {
                anyhow!(
                    "tool '{}' (call {}) timed out after {:?}",
                    request.name,
                    request.id,
                    tool_timeout
                )
            })?
            .with_context(|| format!("tool '{}' (call {}) failed", request.name, request.id))?;

        Ok::<_, anyhow::Error>(ToolCallOutput {
            tool_call_id: request.id.clone(),
            output,
        })
    });

    try_join_all(calls).await
}
