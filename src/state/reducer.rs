use super::message::{DisplayMessage, Role};
use crate::types::{Annotation, AnnotationKind, StreamEvent, TextDelta, ToolCallKind};
use crate::util::file_path;

/// Renderable chat state: the transcript plus the input lock.
///
/// Every delta-style event targets whatever message is currently last.
/// Nothing is looked up by id, so events must be applied in the order the
/// decoder produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    messages: Vec<DisplayMessage>,
    input_locked: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&DisplayMessage> {
        self.messages.last()
    }

    pub fn input_locked(&self) -> bool {
        self.input_locked
    }

    pub fn set_input_locked(&mut self, locked: bool) {
        self.input_locked = locked;
    }

    pub fn push_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(DisplayMessage::user(text));
    }

    /// Fold one event into the state.
    pub fn reduce(mut self, event: &StreamEvent) -> Self {
        self.apply(event);
        self
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::TextCreated => self.on_text_created(),
            StreamEvent::TextDelta(delta) => self.on_text_delta(delta),
            StreamEvent::ImageFileDone { file_id } => self.on_image_file_done(file_id),
            StreamEvent::ToolCallCreated { kind } => self.on_tool_call_created(kind),
            StreamEvent::ToolCallDelta { kind, code_input } => {
                self.on_tool_call_delta(kind, code_input.as_deref())
            }
            // Resolved by the dispatcher; the transcript is unchanged.
            StreamEvent::RunRequiresAction { .. } => {}
            StreamEvent::RunCompleted | StreamEvent::RunFailed { .. } => {}
        }
        if event.is_terminal() {
            self.input_locked = false;
        }
    }

    pub fn on_text_created(&mut self) {
        self.messages.push(DisplayMessage::new(Role::Assistant, ""));
    }

    pub fn on_text_delta(&mut self, delta: &TextDelta) {
        if let Some(annotations) = &delta.annotations {
            self.on_annotate(annotations);
        }
        if let Some(value) = &delta.value {
            self.append_to_last(value);
        }
    }

    /// Rewrite file-path annotation sources in the last message into served
    /// file links. Exact substring, every occurrence, annotations in order.
    pub fn on_annotate(&mut self, annotations: &[Annotation]) {
        let Some(last) = self.messages.last_mut() else {
            tracing::debug!("annotation arrived with no message to patch");
            return;
        };

        for annotation in annotations {
            let AnnotationKind::FilePath { file_id } = &annotation.kind else {
                continue;
            };
            if annotation.text.is_empty() || !last.text.contains(&annotation.text) {
                continue;
            }
            last.text = last.text.replace(&annotation.text, &file_path(file_id));
        }
    }

    pub fn on_image_file_done(&mut self, file_id: &str) {
        let image = format!("\n![{file_id}]({})\n", file_path(file_id));
        self.append_to_last(&image);
    }

    pub fn on_tool_call_created(&mut self, kind: &ToolCallKind) {
        // TODO: decide how file_search and function calls should show up;
        // they currently leave no trace in the transcript.
        if *kind == ToolCallKind::Code {
            self.messages.push(DisplayMessage::new(Role::Code, ""));
        }
    }

    pub fn on_tool_call_delta(&mut self, kind: &ToolCallKind, code_input: Option<&str>) {
        if *kind != ToolCallKind::Code {
            return;
        }
        if let Some(input) = code_input.filter(|input| !input.is_empty()) {
            self.append_to_last(input);
        }
    }

    fn append_to_last(&mut self, text: &str) {
        match self.messages.last_mut() {
            Some(last) => last.text.push_str(text),
            None => tracing::debug!(len = text.len(), "dropping delta with no message to extend"),
        }
    }
}
