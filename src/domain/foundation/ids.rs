//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

/// Opaque token partitioning all bus traffic.
///
/// Unlike UUID-backed identifiers, a session id may be any non-empty string
/// so front ends can reuse their own channel or conversation identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random SessionId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a SessionId from a caller-supplied token.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` if the token is blank.
    pub fn parse(token: impl Into<String>) -> Result<Self, ValidationError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ValidationError::empty_field("session_id"));
        }
        Ok(Self(token))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Routing scope of a bus registration.
///
/// `Global` is the wildcard: a global event subscriber sees events from every
/// session, and a global command handler answers for sessions that have no
/// handler of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    Global,
    Session(SessionId),
}

impl SessionScope {
    /// Returns true if traffic for `session` is routed to this scope.
    pub fn matches(&self, session: &SessionId) -> bool {
        match self {
            SessionScope::Global => true,
            SessionScope::Session(own) => own == session,
        }
    }

    /// Returns true if this is the wildcard scope.
    pub fn is_global(&self) -> bool {
        matches!(self, SessionScope::Global)
    }
}

impl From<SessionId> for SessionScope {
    fn from(session: SessionId) -> Self {
        SessionScope::Session(session)
    }
}

impl From<&SessionId> for SessionScope {
    fn from(session: &SessionId) -> Self {
        SessionScope::Session(session.clone())
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionScope::Global => write!(f, "*"),
            SessionScope::Session(id) => write!(f, "{}", id),
        }
    }
}

/// Unique identifier for events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
