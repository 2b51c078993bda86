use super::logging::emit_stream_parse_error;
use crate::types::wire::{
    MessageContentDelta, MessageDeltaData, RunData, RunStepDeltaData, StepDetailsDelta,
    StreamEnvelope, WireAnnotation,
};
use crate::types::{
    Annotation, AnnotationKind, StreamEvent, TextDelta, ToolCallKind, ToolCallRequest,
};
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::collections::HashSet;

/// Turns run-stream bytes into typed events.
///
/// Accepts both SSE frames (`event:` / `data:` lines closed by a blank line)
/// and newline-delimited JSON envelopes (`{"event": ..., "data": ...}`).
/// Bytes are buffered until a full line is available so multi-byte
/// characters split across chunks survive.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
    frame_event: Option<String>,
    frame_data: Vec<String>,
    seen_tool_calls: HashSet<(String, usize)>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']);
            self.process_line(line, &mut events);
        }

        Ok(events)
    }

    /// Drain whatever is left once the byte stream has ended: an unterminated
    /// last line and any SSE frame still missing its blank line.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.trim_end_matches(['\n', '\r']);
            self.process_line(line, &mut events);
        }
        self.dispatch_frame(&mut events);
        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        if line.is_empty() {
            self.dispatch_frame(events);
        } else if line.starts_with(':') {
            // SSE comment / keep-alive
        } else if let Some(rest) = line.strip_prefix("event:") {
            self.frame_event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            self.frame_data
                .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        } else if line.trim_start().starts_with('{') {
            self.dispatch_frame(events);
            match serde_json::from_str::<StreamEnvelope>(line) {
                Ok(envelope) => self.translate(&envelope.event, envelope.data, events),
                Err(error) => emit_stream_parse_error(None, line, &error),
            }
        } else {
            tracing::trace!(line, "ignoring unrecognised stream line");
        }
    }

    fn dispatch_frame(&mut self, events: &mut Vec<StreamEvent>) {
        let event_type = self.frame_event.take();
        if self.frame_data.is_empty() {
            return;
        }
        let data = std::mem::take(&mut self.frame_data).join("\n");
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return;
        }

        match serde_json::from_str::<serde_json::Value>(data) {
            Ok(value) => match event_type {
                Some(event_type) => self.translate(&event_type, value, events),
                // A bare `data:` frame may itself carry an envelope.
                None => match serde_json::from_value::<StreamEnvelope>(value) {
                    Ok(envelope) => self.translate(&envelope.event, envelope.data, events),
                    Err(error) => emit_stream_parse_error(None, data, &error),
                },
            },
            Err(error) => emit_stream_parse_error(event_type.as_deref(), data, &error),
        }
    }

    fn translate(&mut self, event_type: &str, data: serde_json::Value, events: &mut Vec<StreamEvent>) {
        match event_type {
            "thread.message.created" => events.push(StreamEvent::TextCreated),
            "thread.message.delta" => {
                if let Some(delta) = decode::<MessageDeltaData>(event_type, data) {
                    translate_message_delta(delta, events);
                }
            }
            "thread.run.step.delta" => {
                if let Some(delta) = decode::<RunStepDeltaData>(event_type, data) {
                    self.translate_step_delta(delta, events);
                }
            }
            "thread.run.requires_action" => {
                if let Some(run) = decode::<RunData>(event_type, data) {
                    events.push(requires_action_event(run));
                }
            }
            "thread.run.completed" => events.push(StreamEvent::RunCompleted),
            "thread.run.failed"
            | "thread.run.cancelled"
            | "thread.run.expired"
            | "thread.run.incomplete" => {
                let reason = decode::<RunData>(event_type, data)
                    .and_then(|run| run.last_error)
                    .and_then(|error| error.message.or(error.code))
                    .unwrap_or_else(|| event_type.trim_start_matches("thread.run.").to_string());
                events.push(StreamEvent::RunFailed { reason });
            }
            "error" => {
                let reason = data
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| data.to_string());
                events.push(StreamEvent::RunFailed { reason });
            }
            other => tracing::trace!(event_type = other, "ignoring stream event"),
        }
    }

    fn translate_step_delta(&mut self, delta: RunStepDeltaData, events: &mut Vec<StreamEvent>) {
        let Some(StepDetailsDelta::ToolCalls { tool_calls }) = delta.delta.step_details else {
            return;
        };

        for call in tool_calls {
            let kind = ToolCallKind::from_wire(&call.call_type);
            if self.seen_tool_calls.insert((delta.id.clone(), call.index)) {
                events.push(StreamEvent::ToolCallCreated { kind: kind.clone() });
            }
            let code_input = call.code_interpreter.and_then(|code| code.input);
            events.push(StreamEvent::ToolCallDelta { kind, code_input });
        }
    }
}

fn decode<T: DeserializeOwned>(event_type: &str, data: serde_json::Value) -> Option<T> {
    // Re-serialised only on the error path, for the log line.
    let raw = data.clone();
    match serde_json::from_value::<T>(data) {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            emit_stream_parse_error(Some(event_type), &raw.to_string(), &error);
            None
        }
    }
}

fn translate_message_delta(delta: MessageDeltaData, events: &mut Vec<StreamEvent>) {
    for content in delta.delta.content {
        match content {
            MessageContentDelta::Text {
                text: Some(text), ..
            } => {
                let annotations = text.annotations.map(|annotations| {
                    annotations
                        .into_iter()
                        .map(translate_annotation)
                        .collect::<Vec<_>>()
                });
                events.push(StreamEvent::TextDelta(TextDelta {
                    value: text.value,
                    annotations,
                }));
            }
            MessageContentDelta::ImageFile {
                image_file: Some(file),
                ..
            } => events.push(StreamEvent::ImageFileDone {
                file_id: file.file_id,
            }),
            _ => {}
        }
    }
}

fn translate_annotation(annotation: WireAnnotation) -> Annotation {
    match annotation {
        WireAnnotation::FilePath { text, file_path } => Annotation {
            kind: AnnotationKind::FilePath {
                file_id: file_path.file_id,
            },
            text,
        },
        WireAnnotation::FileCitation {
            text,
            file_citation,
        } => Annotation {
            kind: AnnotationKind::FileCitation {
                file_id: file_citation.file_id,
            },
            text,
        },
        WireAnnotation::Unknown => Annotation {
            kind: AnnotationKind::Other,
            text: String::new(),
        },
    }
}

fn requires_action_event(run: RunData) -> StreamEvent {
    let tool_calls = run
        .required_action
        .map(|action| action.submit_tool_outputs.tool_calls)
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCallRequest {
            id: call.id,
            kind: ToolCallKind::from_wire(&call.call_type),
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    StreamEvent::RunRequiresAction {
        run_id: run.id,
        tool_calls,
    }
}
