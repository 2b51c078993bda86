use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::types::wire::{CreateThreadResponse, PostMessageBody, SubmitActionBody};
use crate::types::ToolCallOutput;
use crate::util::is_local_endpoint_url;
use anyhow::anyhow;
use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[cfg(test)]
pub trait MockBackend: Send + Sync {
    fn create_thread(&self) -> Result<String>;
    fn post_message(&self, thread_id: &str, content: &str) -> Result<ByteStream>;
    fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolCallOutput],
    ) -> Result<ByteStream>;
    fn fetch_file(&self, file_id: &str) -> Result<Bytes>;
}

/// HTTP client for the route layer in front of the assistant backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    #[cfg(test)]
    mock_backend: Option<Arc<dyn MockBackend>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            #[cfg(test)]
            mock_backend: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_backend: Arc<dyn MockBackend>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "http://localhost:3000/api/assistants".to_string(),
            api_key: None,
            mock_backend: Some(mock_backend),
        }
    }

    /// `POST /threads`
    pub async fn create_thread(&self) -> Result<String> {
        #[cfg(test)]
        {
            if let Some(backend) = &self.mock_backend {
                return backend.create_thread();
            }
        }

        let request_url = format!("{}/threads", self.base_url);
        let response = self
            .authorized(self.http.post(&request_url))
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let body: CreateThreadResponse = response
            .json()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;
        tracing::info!(thread_id = %body.thread_id, "created thread");
        Ok(body.thread_id)
    }

    /// `POST /threads/{thread_id}/messages`, returning the run event stream.
    pub async fn post_message(&self, thread_id: &str, content: &str) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(backend) = &self.mock_backend {
                return backend.post_message(thread_id, content);
            }
        }

        let request_url = format!("{}/threads/{thread_id}/messages", self.base_url);
        self.open_stream(request_url, &PostMessageBody { content })
            .await
    }

    /// `POST /threads/{thread_id}/actions`, resuming a run paused on tool calls.
    pub async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolCallOutput],
    ) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(backend) = &self.mock_backend {
                return backend.submit_tool_outputs(thread_id, run_id, outputs);
            }
        }

        let request_url = format!("{}/threads/{thread_id}/actions", self.base_url);
        let body = SubmitActionBody {
            run_id,
            tool_call_outputs: outputs,
        };
        self.open_stream(request_url, &body).await
    }

    pub fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{file_id}", self.base_url)
    }

    /// `GET /files/{file_id}`
    pub async fn fetch_file(&self, file_id: &str) -> Result<Bytes> {
        #[cfg(test)]
        {
            if let Some(backend) = &self.mock_backend {
                return backend.fetch_file(file_id);
            }
        }

        let request_url = self.file_url(file_id);
        self.authorized(self.http.get(&request_url))
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?
            .bytes()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))
    }

    async fn open_stream<T: Serialize>(&self, request_url: String, body: &T) -> Result<ByteStream> {
        if debug_payload_enabled() {
            match serde_json::to_value(body) {
                Ok(payload) => emit_debug_payload(&request_url, &payload),
                Err(error) => tracing::debug!(%error, "could not render request payload"),
            }
        }

        let response = self
            .authorized(self.http.post(&request_url))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.header("authorization", format!("Bearer {api_key}")),
            None => request,
        }
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local chat route '{}': {}. Start the route server or update THREADCHAT_API_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach chat route '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!("'{}' returned HTTP {}: {}", request_url, status, error);
    }
    if error.is_decode() {
        return anyhow!("unexpected response body from '{}': {}", request_url, error);
    }
    anyhow!("request to '{}' failed: {}", request_url, error)
}
