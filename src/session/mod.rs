mod core;
mod dispatch;
mod state;


pub use dispatch::dispatch_tool_calls;
pub use state::{ChatSession, SessionError, SessionUpdate};
