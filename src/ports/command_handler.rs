//! CommandHandler port - the single authoritative answerer of a command.

use async_trait::async_trait;

use crate::domain::bus::{Command, CommandResult};

/// Handler that answers commands of one kind for one scope.
///
/// Failures are reported inside the returned [`CommandResult`]; a handler
/// never makes `execute` itself fail.
///
/// # Example
///
/// ```ignore
/// struct AlwaysYes;
///
/// #[async_trait]
/// impl CommandHandler for AlwaysYes {
///     async fn handle(&self, _command: Command) -> CommandResult {
///         CommandResult::success(true)
///     }
///
///     fn name(&self) -> &'static str {
///         "AlwaysYes"
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Produce the answer to `command`.
    async fn handle(&self, command: Command) -> CommandResult;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}
