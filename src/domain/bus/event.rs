//! Event types - fan-out notifications with zero or more subscribers.
//!
//! Events are how front ends learn about engine progress. Every event
//! carries its session so subscribers can be scoped to one conversation
//! or listen globally.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{EventId, SessionId, Timestamp};

/// Discriminant used as the routing key for event subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Status,
    PromptResponse,
    ToolResult,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Status => write!(f, "status"),
            EventKind::PromptResponse => write!(f, "prompt_response"),
            EventKind::ToolResult => write!(f, "tool_result"),
        }
    }
}

/// A notification published on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Status(StatusEvent),
    PromptResponse(PromptResponseEvent),
    ToolResult(ToolResultEvent),
}

impl Event {
    /// Returns the routing discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Status(_) => EventKind::Status,
            Event::PromptResponse(_) => EventKind::PromptResponse,
            Event::ToolResult(_) => EventKind::ToolResult,
        }
    }

    /// Returns the session this event belongs to.
    pub fn session_id(&self) -> &SessionId {
        match self {
            Event::Status(e) => &e.session_id,
            Event::PromptResponse(e) => &e.session_id,
            Event::ToolResult(e) => &e.session_id,
        }
    }

    /// Returns the unique id of this event.
    pub fn event_id(&self) -> &EventId {
        match self {
            Event::Status(e) => &e.event_id,
            Event::PromptResponse(e) => &e.event_id,
            Event::ToolResult(e) => &e.event_id,
        }
    }

    /// Returns the status payload if this is a status event.
    pub fn as_status(&self) -> Option<&EngineStatus> {
        match self {
            Event::Status(e) => Some(&e.status),
            _ => None,
        }
    }
}

/// Progress state reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineStatus {
    CallingModel,
    ExecutingTool { tool_name: String },
    Finished,
}

impl EngineStatus {
    /// Returns true for the terminal status of a prompt cycle.
    pub fn is_finished(&self) -> bool {
        matches!(self, EngineStatus::Finished)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::CallingModel => write!(f, "Calling LLM..."),
            EngineStatus::ExecutingTool { tool_name } => write!(f, "Executing tool {}", tool_name),
            EngineStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Emitted whenever the engine changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub occurred_at: Timestamp,
    pub status: EngineStatus,
}

impl StatusEvent {
    pub fn new(session_id: SessionId, status: EngineStatus) -> Self {
        Self {
            event_id: EventId::new(),
            session_id,
            occurred_at: Timestamp::now(),
            status,
        }
    }
}

impl From<StatusEvent> for Event {
    fn from(e: StatusEvent) -> Self {
        Event::Status(e)
    }
}

/// Emitted once a prompt has been answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResponseEvent {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub occurred_at: Timestamp,
    pub prompt: String,
    pub response: String,
    /// Always `None` for final responses; a final answer never requests tools.
    pub tool_calls: Option<Vec<String>>,
}

impl PromptResponseEvent {
    pub fn new(session_id: SessionId, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            event_id: EventId::new(),
            session_id,
            occurred_at: Timestamp::now(),
            prompt: prompt.into(),
            response: response.into(),
            tool_calls: None,
        }
    }
}

impl From<PromptResponseEvent> for Event {
    fn from(e: PromptResponseEvent) -> Self {
        Event::PromptResponse(e)
    }
}

/// Emitted after a tool has produced output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultEvent {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub occurred_at: Timestamp,
    pub tool_name: String,
    pub result: String,
}

impl ToolResultEvent {
    pub fn new(session_id: SessionId, tool_name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            event_id: EventId::new(),
            session_id,
            occurred_at: Timestamp::now(),
            tool_name: tool_name.into(),
            result: result.into(),
        }
    }
}

impl From<ToolResultEvent> for Event {
    fn from(e: ToolResultEvent) -> Self {
        Event::ToolResult(e)
    }
}
