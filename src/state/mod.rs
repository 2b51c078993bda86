mod message;
mod reducer;


pub use message::{DisplayMessage, Role};
pub use reducer::ChatState;
