use anyhow::Result;
use crossterm::event::{self, Event};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use threadchat::api::ApiClient;
use threadchat::config::Config;
use threadchat::session::{ChatSession, SessionUpdate};
use threadchat::state::ChatState;
use threadchat::telemetry;
use threadchat::terminal::TerminalGuard;
use threadchat::tools::{ToolRegistry, WorkspaceFiles};
use threadchat::ui::editor::{InputAction, InputEditor};
use threadchat::ui::layout::split_chat_layout;
use threadchat::ui::render::{render_input, render_status_line, render_transcript};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const FRAME_POLL: Duration = Duration::from_millis(16);
const SCROLL_STEP: usize = 5;

enum Command {
    Send {
        content: String,
        cancel: CancellationToken,
    },
    Save {
        file_id: String,
        dest: PathBuf,
    },
}

/// Parse `/save <fileId> <path>`. Anything else is a chat message.
fn parse_save(input: &str) -> Option<Result<(String, PathBuf), &'static str>> {
    let rest = input.strip_prefix("/save")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(file_id), Some(dest), None) => Some(Ok((file_id.to_string(), PathBuf::from(dest)))),
        _ => Some(Err("usage: /save <fileId> <path>")),
    }
}

/// Owns the session; runs one command at a time so sends never overlap.
async fn session_worker(
    mut session: ChatSession,
    mut commands: mpsc::UnboundedReceiver<Command>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    notices: mpsc::UnboundedSender<String>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Send { content, cancel } => {
                // Failures already reach the view as SessionUpdate::Error.
                let _ = session
                    .send_message_with_cancel(content, Some(&updates), &cancel)
                    .await;
            }
            Command::Save { file_id, dest } => {
                let notice = match session.download_file(&file_id, &dest).await {
                    Ok(len) => format!("saved {file_id} to {} ({len} bytes)", dest.display()),
                    Err(error) => format!("save failed: {error:#}"),
                };
                let _ = notices.send(notice);
            }
        }
    }
}

struct ChatView {
    mirror: ChatState,
    editor: InputEditor,
    thread_id: String,
    scroll_from_bottom: usize,
    notice: Option<String>,
    active_run: Option<CancellationToken>,
    quit: bool,
}

impl ChatView {
    fn new(thread_id: String) -> Self {
        Self {
            mirror: ChatState::new(),
            editor: InputEditor::new(),
            thread_id,
            scroll_from_bottom: 0,
            notice: None,
            active_run: None,
            quit: false,
        }
    }

    fn apply_update(&mut self, update: SessionUpdate) {
        match &update {
            SessionUpdate::Error(message) => self.notice = Some(message.clone()),
            SessionUpdate::InputLocked(false) => self.active_run = None,
            SessionUpdate::UserMessage(_) => self.scroll_from_bottom = 0,
            _ => {}
        }
        update.apply_to(&mut self.mirror);
    }

    fn status(&self) -> String {
        let run = if self.mirror.input_locked() {
            "running (Ctrl+C to cancel)"
        } else {
            "ready"
        };
        match &self.notice {
            Some(notice) => format!("thread {} | {run} | {notice}", self.thread_id),
            None => format!("thread {} | {run} | Ctrl+D quits", self.thread_id),
        }
    }

    fn handle_action(&mut self, action: InputAction, commands: &mpsc::UnboundedSender<Command>) {
        match action {
            InputAction::None => {}
            InputAction::Quit => self.quit = true,
            InputAction::Interrupt => {
                if let Some(cancel) = &self.active_run {
                    cancel.cancel();
                }
            }
            InputAction::ScrollUp => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(SCROLL_STEP);
            }
            InputAction::ScrollDown => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(SCROLL_STEP);
            }
            InputAction::Submit(text) => self.submit(text, commands),
        }
    }

    fn submit(&mut self, text: String, commands: &mpsc::UnboundedSender<Command>) {
        match parse_save(&text) {
            Some(Ok((file_id, dest))) => {
                self.notice = Some(format!("saving {file_id}..."));
                let _ = commands.send(Command::Save { file_id, dest });
            }
            Some(Err(usage)) => self.notice = Some(usage.to_string()),
            None => {
                if self.mirror.input_locked() {
                    return;
                }
                // Lock locally until the worker's own lock update arrives.
                self.mirror.set_input_locked(true);
                self.notice = None;
                let cancel = CancellationToken::new();
                self.active_run = Some(cancel.clone());
                let _ = commands.send(Command::Send {
                    content: text,
                    cancel,
                });
            }
        }
    }
}

fn drain_pending_terminal_events() {
    for _ in 0..1024 {
        match event::poll(Duration::ZERO) {
            Ok(true) => {
                if event::read().is_err() {
                    break;
                }
            }
            Ok(false) | Err(_) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;
    telemetry::init_tracing(&config.log_path)?;
    tracing::info!(api_url = %config.api_url, "starting threadchat");

    let mut tools = ToolRegistry::new();
    WorkspaceFiles::new(std::env::current_dir()?).register(&mut tools);
    tracing::info!(tools = ?tools.names().collect::<Vec<_>>(), "registered tools");

    let client = ApiClient::new(&config)?;
    let mut session = ChatSession::new(client, Arc::new(tools), &config);
    let thread_id = session.start().await?.to_string();
    tracing::info!(thread_id = %thread_id, "thread created");

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(session_worker(session, command_rx, update_tx, notice_tx));

    let mut guard = TerminalGuard::enter()?;
    drain_pending_terminal_events();
    let mut view = ChatView::new(thread_id);

    while !view.quit {
        while let Ok(update) = update_rx.try_recv() {
            view.apply_update(update);
        }
        while let Ok(notice) = notice_rx.try_recv() {
            view.notice = Some(notice);
        }

        guard.terminal().draw(|frame| {
            let panes = split_chat_layout(frame.area());
            render_status_line(frame, panes.status, &view.status());
            render_transcript(
                frame,
                panes.transcript,
                view.mirror.messages(),
                view.scroll_from_bottom,
            );
            render_input(
                frame,
                panes.input,
                view.editor.buffer(),
                view.editor.cursor(),
                view.mirror.input_locked(),
            );
        })?;

        if event::poll(FRAME_POLL)? {
            let event = event::read()?;
            if matches!(event, Event::Resize(..)) {
                continue;
            }
            let action = view.editor.apply_event(event);
            view.handle_action(action, &command_tx);
        } else {
            tokio::task::yield_now().await;
        }
    }

    if let Some(cancel) = &view.active_run {
        cancel.cancel();
    }
    drop(command_tx);
    drop(guard);
    if let Err(error) = worker.await {
        tracing::warn!(%error, "session worker did not shut down cleanly");
    }
    tracing::info!("threadchat exited");
    Ok(())
}
