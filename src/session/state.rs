use crate::api::ApiClient;
use crate::config::Config;
use crate::state::{ChatState, DisplayMessage};
use crate::tools::ToolHandler;
use crate::types::StreamEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// What a view needs to mirror the session: applying every update in order
/// to a fresh `ChatState` reproduces the session's own state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    UserMessage(String),
    Event(StreamEvent),
    InputLocked(bool),
    Error(String),
}

impl SessionUpdate {
    pub fn apply_to(&self, state: &mut ChatState) {
        match self {
            Self::UserMessage(text) => state.push_user_message(text.clone()),
            Self::Event(event) => state.apply(event),
            Self::InputLocked(locked) => state.set_input_locked(*locked),
            Self::Error(_) => {}
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no thread exists yet; start the session before sending")]
    NoThread,
    #[error("a message is already in flight")]
    Busy,
    #[error("transport failure: {0:#}")]
    Transport(anyhow::Error),
    #[error("tool dispatch failed: {0:#}")]
    ToolDispatch(anyhow::Error),
    #[error("run failed: {0}")]
    RunFailed(String),
    #[error("no run event received within {0:?}")]
    RunTimedOut(Duration),
    #[error("run stream closed before the run finished")]
    StreamEnded,
    #[error("send cancelled")]
    Cancelled,
}

/// One conversation: a backend thread plus the local transcript and input
/// lock derived from its run events.
pub struct ChatSession {
    pub(super) client: Arc<ApiClient>,
    pub(super) tools: Arc<dyn ToolHandler>,
    pub(super) tool_timeout: Duration,
    pub(super) run_timeout: Option<Duration>,
    pub(super) thread_id: Option<String>,
    pub(super) state: ChatState,
}

impl ChatSession {
    pub fn new(client: ApiClient, tools: Arc<dyn ToolHandler>, config: &Config) -> Self {
        Self {
            client: Arc::new(client),
            tools,
            tool_timeout: config.tool_timeout,
            run_timeout: config.run_timeout,
            thread_id: None,
            state: ChatState::new(),
        }
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        self.state.messages()
    }

    pub fn input_locked(&self) -> bool {
        self.state.input_locked()
    }

    pub(super) fn set_input_locked(
        &mut self,
        locked: bool,
        updates: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    ) {
        self.state.set_input_locked(locked);
        emit_update(updates, SessionUpdate::InputLocked(locked));
    }
}

pub(super) fn emit_update(
    updates: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    update: SessionUpdate,
) {
    if let Some(tx) = updates {
        let _ = tx.send(update);
    }
}
