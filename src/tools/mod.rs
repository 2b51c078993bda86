mod registry;
mod workspace;

pub use registry::{FnTool, ToolRegistry};
pub use workspace::WorkspaceFiles;

use crate::types::ToolCallRequest;
use anyhow::Result;
use async_trait::async_trait;

/// Resolves one pending tool call into the output string handed back to the
/// run. An `Err` aborts the whole batch it belongs to.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, request: &ToolCallRequest) -> Result<String>;
}
