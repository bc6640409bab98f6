//! Application layer - engine sessions and process bootstrap.
//!
//! This layer wires the bus, model, context, and tools into the agent loop.

pub mod engine;
pub mod logging;

pub use engine::{EngineCore, EngineError, ToolUseEngine, ToolUseEngineBuilder};
pub use logging::init_tracing;
