use crate::api::client::{ByteStream, MockBackend};
use crate::types::ToolCallOutput;
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One recorded call against the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateThread,
    PostMessage {
        thread_id: String,
        content: String,
    },
    SubmitToolOutputs {
        thread_id: String,
        run_id: String,
        outputs: Vec<ToolCallOutput>,
    },
}

/// Replays canned run streams in order, one per post/submit call.
#[derive(Clone)]
pub struct MockApiClient {
    thread_id: Option<String>,
    responses: Arc<Mutex<Vec<Vec<String>>>>,
    files: HashMap<String, Bytes>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            thread_id: Some("thread_mock".to_string()),
            responses: Arc::new(Mutex::new(responses)),
            files: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn without_thread(mut self) -> Self {
        self.thread_id = None;
        self
    }

    pub fn with_file(mut self, file_id: &str, content: &[u8]) -> Self {
        self.files
            .insert(file_id.to_string(), Bytes::copy_from_slice(content));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_stream(&self) -> Result<ByteStream> {
        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!(
                "MockApiClient: No more responses configured"
            ));
        }
        let current_chunks = responses_guard.remove(0);

        let byte_chunks: Vec<Result<Bytes>> = current_chunks
            .into_iter()
            .map(|s| {
                let framed = if s.ends_with("\n\n") {
                    s
                } else {
                    format!("{s}\n\n")
                };
                Ok(Bytes::from(framed))
            })
            .collect();

        Ok(Box::pin(stream::iter(byte_chunks)))
    }
}

impl MockBackend for MockApiClient {
    fn create_thread(&self) -> Result<String> {
        self.calls.lock().unwrap().push(MockCall::CreateThread);
        self.thread_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MockApiClient: thread creation refused"))
    }

    fn post_message(&self, thread_id: &str, content: &str) -> Result<ByteStream> {
        self.calls.lock().unwrap().push(MockCall::PostMessage {
            thread_id: thread_id.to_string(),
            content: content.to_string(),
        });
        self.next_stream()
    }

    fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolCallOutput],
    ) -> Result<ByteStream> {
        self.calls.lock().unwrap().push(MockCall::SubmitToolOutputs {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            outputs: outputs.to_vec(),
        });
        self.next_stream()
    }

    fn fetch_file(&self, file_id: &str) -> Result<Bytes> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockApiClient: no file '{file_id}'"))
    }
}
