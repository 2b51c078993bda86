use super::ToolHandler;
use crate::types::ToolCallRequest;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxedToolFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// Wraps an async closure over the raw argument string as a handler.
pub struct FnTool {
    func: Box<dyn Fn(String) -> BoxedToolFuture + Send + Sync>,
}

impl FnTool {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            func: Box::new(move |arguments| Box::pin(func(arguments))),
        }
    }
}

#[async_trait]
impl ToolHandler for FnTool {
    async fn call(&self, request: &ToolCallRequest) -> Result<String> {
        (self.func)(request.arguments.clone()).await
    }
}

/// Routes function calls to handlers registered under the function name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn with(mut self, name: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        self.register(name, Arc::new(handler));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

#[async_trait]
impl ToolHandler for ToolRegistry {
    async fn call(&self, request: &ToolCallRequest) -> Result<String> {
        let Some(handler) = self.handlers.get(&request.name) else {
            bail!(
                "no handler registered for tool '{}' (call {})",
                request.name,
                request.id
            );
        };
        handler.call(request).await
    }
}
