//! Conversation turns - the ordered history sent to the language model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::tools::{ToolCallRequest, ToolCallResult};

/// Role of a plain-text turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    System {
        content: String,
    },
    User {
        content: String,
    },
    /// A model reply. Carries the tool calls exactly as the model emitted them.
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool(ToolCallResult),
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Turn::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    /// A text-only assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Builds a plain-text turn for `role`.
    pub fn from_role(role: Role, content: impl Into<String>) -> Self {
        match role {
            Role::System => Turn::system(content),
            Role::User => Turn::user(content),
            Role::Assistant => Turn::assistant(content),
        }
    }

    /// Returns the text content, if the turn has any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Turn::System { content } | Turn::User { content } => Some(content.as_str()),
            Turn::Assistant { content, .. } => content.as_deref(),
            Turn::Tool(result) => Some(result.content.as_str()),
        }
    }

    /// Returns the tool calls requested by an assistant turn.
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Turn::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Turn::System { .. })
    }
}

impl From<ToolCallResult> for Turn {
    fn from(result: ToolCallResult) -> Self {
        Turn::Tool(result)
    }
}
