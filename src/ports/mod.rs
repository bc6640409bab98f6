//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! ## Bus Ports
//!
//! - `CommandHandler` - Single answerer of a command kind for a scope
//! - `EventHandler` - Subscriber that processes published events
//!
//! ## Collaborator Ports
//!
//! - `LanguageModel` - Tool-calling chat model
//! - `Tool` - A callable tool offered to the model
//! - `ConversationContext` - Chat history of one engine session

mod command_handler;
mod conversation_context;
mod event_handler;
mod language_model;
mod tool;

pub use command_handler::CommandHandler;
pub use conversation_context::ConversationContext;
pub use event_handler::EventHandler;
pub use language_model::{AIError, LanguageModel, ModelResponse, ProviderInfo};
pub use tool::{Tool, ToolExecutionError};
