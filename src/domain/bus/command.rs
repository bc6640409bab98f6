//! Command types - point-to-point requests routed to exactly one handler.
//!
//! Commands are a closed set. The bus keys its handler table on
//! [`CommandKind`] plus the command's session, so adding a command means
//! adding a variant here rather than relying on runtime type inspection.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::foundation::SessionId;

/// Discriminant used as the routing key for command handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Process a user prompt through the tool-use loop.
    Prompt,
    /// Ask a human to approve a pending action.
    Confirmation,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Prompt => write!(f, "prompt"),
            CommandKind::Confirmation => write!(f, "confirmation"),
        }
    }
}

/// A request needing exactly one authoritative answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Prompt(PromptCommand),
    Confirmation(ConfirmationCommand),
}

impl Command {
    /// Returns the routing discriminant.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Prompt(_) => CommandKind::Prompt,
            Command::Confirmation(_) => CommandKind::Confirmation,
        }
    }

    /// Returns the session this command belongs to.
    pub fn session_id(&self) -> &SessionId {
        match self {
            Command::Prompt(cmd) => &cmd.session_id,
            Command::Confirmation(cmd) => &cmd.session_id,
        }
    }
}

/// Command to process a user prompt with tool usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCommand {
    pub session_id: SessionId,
    pub prompt: String,
}

impl PromptCommand {
    /// Creates a new prompt command.
    pub fn new(session_id: SessionId, prompt: impl Into<String>) -> Self {
        Self {
            session_id,
            prompt: prompt.into(),
        }
    }
}

impl From<PromptCommand> for Command {
    fn from(cmd: PromptCommand) -> Self {
        Command::Prompt(cmd)
    }
}

/// Command asking the user to confirm an action.
///
/// `prompt` is the human-readable description of the pending action. The
/// handler answers with a boolean `result`; anything else is a denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationCommand {
    pub session_id: SessionId,
    pub prompt: String,
}

impl ConfirmationCommand {
    /// Creates a new confirmation command.
    pub fn new(session_id: SessionId, prompt: impl Into<String>) -> Self {
        Self {
            session_id,
            prompt: prompt.into(),
        }
    }
}

impl From<ConfirmationCommand> for Command {
    fn from(cmd: ConfirmationCommand) -> Self {
        Command::Confirmation(cmd)
    }
}

/// Outcome of executing a command.
///
/// A failed result never carries a value and always carries an error
/// message. A successful result may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCommandResult")]
pub struct CommandResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Wire shape of [`CommandResult`], checked before it becomes one.
#[derive(Deserialize)]
struct RawCommandResult {
    success: bool,
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawCommandResult> for CommandResult {
    type Error = &'static str;

    fn try_from(raw: RawCommandResult) -> Result<Self, Self::Error> {
        match (raw.success, raw.result, raw.error) {
            (true, _, Some(_)) => Err("a successful command result cannot carry an error"),
            (true, result, None) => Ok(Self {
                success: true,
                result,
                error: None,
            }),
            (false, Some(_), _) => Err("a failed command result cannot carry a result"),
            (false, None, Some(error)) => Ok(Self::failure(error)),
            (false, None, None) => Err("a failed command result must carry an error"),
        }
    }
}

impl CommandResult {
    /// Creates a successful result carrying a value.
    pub fn success(result: impl Into<JsonValue>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    /// Creates a successful result without a value.
    pub fn success_empty() -> Self {
        Self {
            success: true,
            result: None,
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Returns whether the command succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the result value (if any).
    pub fn result(&self) -> Option<&JsonValue> {
        self.result.as_ref()
    }

    /// Returns the error message (if any).
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Consumes self and returns the result value.
    pub fn into_result(self) -> Option<JsonValue> {
        self.result
    }

    /// Returns the result as text, if it is a JSON string.
    pub fn result_text(&self) -> Option<&str> {
        self.result.as_ref().and_then(JsonValue::as_str)
    }

    /// Interprets this result as the answer to a confirmation.
    ///
    /// Only an explicit `true` on a successful result counts as approval.
    pub fn is_approved(&self) -> bool {
        self.success && matches!(self.result, Some(JsonValue::Bool(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> SessionId {
        SessionId::parse("session-1").unwrap()
    }

    #[test]
    fn command_kind_matches_variant() {
        let prompt: Command = PromptCommand::new(session(), "hi").into();
        let confirm: Command = ConfirmationCommand::new(session(), "ok?").into();

        assert_eq!(prompt.kind(), CommandKind::Prompt);
        assert_eq!(confirm.kind(), CommandKind::Confirmation);
        assert_eq!(prompt.session_id(), &session());
    }

    #[test]
    fn failure_never_carries_result() {
        let result = CommandResult::failure("boom");

        assert!(!result.is_success());
        assert!(result.result().is_none());
        assert_eq!(result.error(), Some("boom"));
    }

    #[test]
    fn success_may_be_empty() {
        let result = CommandResult::success_empty();
        assert!(result.is_success());
        assert!(result.result().is_none());
        assert!(result.error().is_none());
    }

    #[test]
    fn only_explicit_true_is_approval() {
        assert!(CommandResult::success(true).is_approved());
        assert!(!CommandResult::success(false).is_approved());
        assert!(!CommandResult::success("yes").is_approved());
        assert!(!CommandResult::success(json!(1)).is_approved());
        assert!(!CommandResult::success_empty().is_approved());
        assert!(!CommandResult::failure("timed out").is_approved());
    }

    #[test]
    fn result_text_reads_string_values() {
        assert_eq!(CommandResult::success("done").result_text(), Some("done"));
        assert_eq!(CommandResult::success(json!({"a": 1})).result_text(), None);
    }

    #[test]
    fn command_serializes_with_type_tag() {
        let cmd: Command = PromptCommand::new(session(), "hello").into();
        let json = serde_json::to_value(&cmd).unwrap();

        assert_eq!(json["type"], "prompt");
        assert_eq!(json["session_id"], "session-1");
        assert_eq!(json["prompt"], "hello");
    }

    #[test]
    fn command_result_skips_empty_fields() {
        let json = serde_json::to_string(&CommandResult::success_empty()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[test]
    fn command_result_deserialization_enforces_the_failure_shape() {
        let failed: CommandResult = serde_json::from_str(r#"{"success":false,"error":"denied"}"#).unwrap();
        assert_eq!(failed, CommandResult::failure("denied"));

        let approved: CommandResult = serde_json::from_str(r#"{"success":true,"result":true}"#).unwrap();
        assert!(approved.is_approved());

        for invalid in [
            r#"{"success":false,"result":1}"#,
            r#"{"success":false,"result":1,"error":"x"}"#,
            r#"{"success":false}"#,
            r#"{"success":true,"error":"x"}"#,
        ] {
            assert!(
                serde_json::from_str::<CommandResult>(invalid).is_err(),
                "accepted {invalid}"
            );
        }
    }
}
