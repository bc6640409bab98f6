//! Tool-use engine - the agent loop and the session that owns it.
//!
//! - [`ToolUseEngine`] - Session facade; registers the `Prompt` handler
//! - [`EngineCore`] - The agent loop, answering `Prompt` commands
//! - [`EngineError`] - Build and prompt failures

mod agent_loop;
mod error;
mod session;

pub use agent_loop::{EngineCore, BUDGET_EXHAUSTED_REPLY, DECLINED_REPLY, TOOL_FAILURE_PREFIX};
pub use error::EngineError;
pub use session::{ToolUseEngine, ToolUseEngineBuilder};
