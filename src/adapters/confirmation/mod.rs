//! Confirmation adapters - command handlers answering `Confirmation` commands.
//!
//! - `StaticConfirmationHandler` - Approves or denies everything
//! - `RecordingConfirmationHandler` - Scripted answers plus request log
//! - `ChannelConfirmationHandler` - Asks a front end over a channel, with timeout

mod channel;
mod scripted;

pub use channel::{ChannelConfirmationHandler, PendingConfirmation};
pub use scripted::{RecordingConfirmationHandler, StaticConfirmationHandler};
