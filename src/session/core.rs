use super::dispatch::dispatch_tool_calls;
use super::state::{emit_update, ChatSession, SessionError, SessionUpdate};
use crate::api::{ByteStream, StreamParser};
use crate::types::{StreamEvent, ToolCallRequest};
use anyhow::Context;
use futures::StreamExt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Where a run stream left the conversation.
enum RunPause {
    Completed,
    RequiresAction {
        run_id: String,
        tool_calls: Vec<ToolCallRequest>,
    },
}

impl ChatSession {
    /// Create the backend thread. Later calls reuse the existing one.
    pub async fn start(&mut self) -> Result<&str, SessionError> {
        if self.thread_id.is_none() {
            let thread_id = self
                .client
                .create_thread()
                .await
                .map_err(SessionError::Transport)?;
            self.thread_id = Some(thread_id);
        }
        Ok(self.thread_id.as_deref().unwrap_or_default())
    }

    pub async fn send_message(
        &mut self,
        content: String,
        updates: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    ) -> Result<(), SessionError> {
        self.send_message_with_cancel(content, updates, &CancellationToken::new())
            .await
    }

    /// Post `content`, fold the run's events into the transcript and resolve
    /// tool calls until the run finishes. Input is locked for the duration
    /// and unlocked on every exit path.
    pub async fn send_message_with_cancel(
        &mut self,
        content: String,
        updates: Option<&mpsc::UnboundedSender<SessionUpdate>>,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let Some(thread_id) = self.thread_id.clone() else {
            tracing::error!("send attempted before a thread was created");
            return Err(SessionError::NoThread);
        };
        if self.state.input_locked() {
            tracing::warn!(thread_id = %thread_id, "send rejected while a run is active");
            return Err(SessionError::Busy);
        }

        self.state.push_user_message(content.clone());
        emit_update(updates, SessionUpdate::UserMessage(content.clone()));
        self.set_input_locked(true, updates);

        let result = self.run_turn(&thread_id, &content, updates, cancel).await;

        self.set_input_locked(false, updates);
        match &result {
            Ok(()) => tracing::info!(thread_id = %thread_id, "run completed"),
            Err(error) => {
                tracing::error!(thread_id = %thread_id, %error, "send failed");
                emit_update(updates, SessionUpdate::Error(error.to_string()));
            }
        }
        result
    }

    /// Save a backend file (an image or code interpreter output) to `dest`.
    pub async fn download_file(&self, file_id: &str, dest: &Path) -> anyhow::Result<usize> {
        let bytes = self.client.fetch_file(file_id).await?;
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        tracing::info!(file_id, dest = %dest.display(), len = bytes.len(), "saved file");
        Ok(bytes.len())
    }

    async fn run_turn(
        &mut self,
        thread_id: &str,
        content: &str,
        updates: Option<&mpsc::UnboundedSender<SessionUpdate>>,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let mut stream = within_limits(
            self.client.post_message(thread_id, content),
            self.run_timeout,
            cancel,
        )
        .await?
        .map_err(SessionError::Transport)?;

        loop {
            match self.consume_run(stream, updates, cancel).await? {
                RunPause::Completed => return Ok(()),
                RunPause::RequiresAction { run_id, tool_calls } => {
                    tracing::info!(
                        run_id = %run_id,
                        count = tool_calls.len(),
                        "run requires tool outputs"
                    );
                    let outputs = tokio::select! {
                        _ = cancel.cancelled() => return Err(SessionError::Cancelled),
                        outputs = dispatch_tool_calls(self.tools.as_ref(), &tool_calls, self.tool_timeout) => {
                            outputs.map_err(SessionError::ToolDispatch)?
                        }
                    };

                    self.set_input_locked(true, updates);
                    stream = within_limits(
                        self.client.submit_tool_outputs(thread_id, &run_id, &outputs),
                        self.run_timeout,
                        cancel,
                    )
                    .await?
                    .map_err(SessionError::Transport)?;
                }
            }
        }
    }

    async fn consume_run(
        &mut self,
        mut stream: ByteStream,
        updates: Option<&mpsc::UnboundedSender<SessionUpdate>>,
        cancel: &CancellationToken,
    ) -> Result<RunPause, SessionError> {
        let mut parser = StreamParser::new();

        loop {
            let next = within_limits(stream.next(), self.run_timeout, cancel).await?;
            let ended = next.is_none();
            let events = match next {
                Some(chunk) => {
                    let chunk = chunk.map_err(SessionError::Transport)?;
                    parser.process(&chunk).map_err(SessionError::Transport)?
                }
                None => parser.finish(),
            };

            for event in events {
                if let Some(pause) = self.apply_event(event, updates)? {
                    return Ok(pause);
                }
            }

            if ended {
                return Err(SessionError::StreamEnded);
            }
        }
    }

    fn apply_event(
        &mut self,
        event: StreamEvent,
        updates: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    ) -> Result<Option<RunPause>, SessionError> {
        self.state.apply(&event);
        emit_update(updates, SessionUpdate::Event(event.clone()));

        match event {
            StreamEvent::RunCompleted => Ok(Some(RunPause::Completed)),
            StreamEvent::RunFailed { reason } => Err(SessionError::RunFailed(reason)),
            StreamEvent::RunRequiresAction { run_id, tool_calls } => {
                Ok(Some(RunPause::RequiresAction { run_id, tool_calls }))
            }
            _ => Ok(None),
        }
    }
}

/// Await one backend step (opening a route or reading the next chunk),
/// giving up when `cancel` fires or `run_timeout` passes without progress.
async fn within_limits<F: Future>(
    step: F,
    run_timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<F::Output, SessionError> {
    let step = async {
        match run_timeout {
            Some(limit) => tokio::time::timeout(limit, step)
                .await
                .map_err(|_| SessionError::RunTimedOut(limit)),
            None => Ok(step.await),
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => Err(SessionError::Cancelled),
        outcome = step => outcome,
    }
}
