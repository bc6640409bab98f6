//! Tool Loop Engine - session-scoped command/event bus and an LLM tool-use loop
//!
//! A [`MessageBus`](adapters::bus::MessageBus) routes point-to-point commands
//! to one handler per session and fans events out to subscribers. Each
//! [`ToolUseEngine`](application::engine::ToolUseEngine) answers `Prompt`
//! commands for its session by looping between the model and its tools,
//! asking for confirmation before mutating tools run.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::bus::MessageBus;
pub use application::engine::{EngineError, ToolUseEngine};
pub use config::AppConfig;
