//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, and error types that the bus,
//! conversation, and tool modules build on.

mod errors;
mod ids;
mod timestamp;

pub use errors::{panic_message, DomainError, ErrorCode, ValidationError};
pub use ids::{EventId, SessionId, SessionScope};
pub use timestamp::Timestamp;
