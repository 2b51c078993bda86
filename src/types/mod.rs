mod events;
pub mod wire;

pub use events::{
    Annotation, AnnotationKind, StreamEvent, TextDelta, ToolCallKind, ToolCallOutput,
    ToolCallRequest,
};
