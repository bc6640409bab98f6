//! Tool call types - a model's request to invoke a tool and its outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single tool invocation requested by the model.
///
/// `arguments` holds the raw JSON text exactly as the model produced it.
/// The conversation context stores it verbatim so the next model call sees
/// its own request unchanged; it is only parsed when the call is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned id, echoed back in the matching result turn.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Raw JSON argument object.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Creates a new tool call request.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parses the raw arguments.
    ///
    /// An empty or whitespace-only argument string is read as `{}`; some
    /// providers send nothing for parameterless tools.
    pub fn parse_arguments(&self) -> Result<JsonValue, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(JsonValue::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.arguments)
    }
}

/// The recorded outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Id of the request this answers.
    pub tool_call_id: String,
    /// Name of the tool that was (or was not) invoked.
    pub name: String,
    /// Text given back to the model.
    pub content: String,
}

impl ToolCallResult {
    /// Creates a result answering `request`.
    pub fn for_request(request: &ToolCallRequest, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: request.id.clone(),
            name: request.name.clone(),
            content: content.into(),
        }
    }
}

/// Renders a tool's output as the text placed in the context.
///
/// Strings pass through untouched, everything else is serialized as JSON.
pub fn stringify_result(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
