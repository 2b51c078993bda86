use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// Code interpreter input, rendered as a code block.
    Code,
}

/// One entry of the rendered transcript. The role is fixed at creation;
/// only the text of the newest message is ever amended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayMessage {
    role: Role,
    pub text: String,
}

impl DisplayMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self::new(Role::Code, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
