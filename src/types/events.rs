use serde::{Deserialize, Serialize};

/// Typed run event, in the order the decoder produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextCreated,
    TextDelta(TextDelta),
    ImageFileDone {
        file_id: String,
    },
    ToolCallCreated {
        kind: ToolCallKind,
    },
    ToolCallDelta {
        kind: ToolCallKind,
        code_input: Option<String>,
    },
    RunRequiresAction {
        run_id: String,
        tool_calls: Vec<ToolCallRequest>,
    },
    RunCompleted,
    /// Run ended without completing (failed, cancelled, expired, incomplete)
    /// or the stream reported an error.
    RunFailed {
        reason: String,
    },
}

impl StreamEvent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::TextDelta(TextDelta {
            value: Some(value.into()),
            annotations: None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunCompleted | Self::RunFailed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDelta {
    pub value: Option<String>,
    pub annotations: Option<Vec<Annotation>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    /// Substring of already-streamed text this annotation patches.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationKind {
    FilePath { file_id: String },
    FileCitation { file_id: String },
    Other,
}

impl Annotation {
    pub fn file_path(text: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            kind: AnnotationKind::FilePath {
                file_id: file_id.into(),
            },
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolCallKind {
    Code,
    FileSearch,
    Function,
    Other(String),
}

impl ToolCallKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "code_interpreter" => Self::Code,
            "file_search" => Self::FileSearch,
            "function" => Self::Function,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A pending tool call the backend is waiting on. `arguments` is forwarded
/// to the handler untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub id: String,
    pub kind: ToolCallKind,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallOutput {
    pub tool_call_id: String,
    pub output: String,
}
