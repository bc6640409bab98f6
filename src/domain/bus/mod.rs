//! Bus vocabulary - commands, events, results, and bus errors.
//!
//! ## Key Types
//!
//! - [`Command`] - Point-to-point request, answered by exactly one handler
//! - [`CommandResult`] - The single answer to a command
//! - [`Event`] - Fan-out notification, delivered to every matching subscriber
//! - [`BusError`] - Registration, routing, and lifecycle failures

mod command;
mod errors;
mod event;

pub use command::{Command, CommandKind, CommandResult, ConfirmationCommand, PromptCommand};
pub use errors::BusError;
pub use event::{
    EngineStatus, Event, EventKind, PromptResponseEvent, StatusEvent, ToolResultEvent,
};
