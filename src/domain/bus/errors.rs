//! Bus error taxonomy.

use thiserror::Error;

use super::CommandKind;
use crate::domain::foundation::{SessionId, SessionScope};

/// Errors raised by the message bus itself.
///
/// Handler outcomes are never reported here; they travel inside the
/// `CommandResult` returned by `execute`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// A second handler was registered for the same (kind, scope).
    #[error("duplicate registration: a {kind} handler is already registered for session {scope}")]
    DuplicateRegistration { kind: CommandKind, scope: SessionScope },

    /// No handler answers this command for its session.
    #[error("unhandled command: no {kind} handler registered for session {session}")]
    UnhandledCommand { kind: CommandKind, session: SessionId },

    /// `execute` or `publish` was called outside `start()`/`stop()`.
    #[error("message bus is not running")]
    BusNotRunning,
}
