//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to the outside world:
//! - `bus` - In-process message bus and event recorder
//! - `ai` - OpenAI-compatible chat model and a scripted model for tests
//! - `confirmation` - Handlers answering confirmation commands
//! - `history` - In-memory conversation context
//! - `tools` - Closure-backed tools

pub mod ai;
pub mod bus;
pub mod confirmation;
pub mod history;
pub mod tools;

pub use ai::{OpenAIChatConfig, OpenAIChatModel, ScriptedLanguageModel};
pub use bus::{EventRecorder, MessageBus, SubscriptionId};
pub use confirmation::{
    ChannelConfirmationHandler, PendingConfirmation, RecordingConfirmationHandler,
    StaticConfirmationHandler,
};
pub use history::InMemoryChatHistory;
pub use tools::FunctionTool;
