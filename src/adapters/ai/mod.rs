//! Language model adapters.
//!
//! - `ScriptedLanguageModel` - Replays a queue of replies (tests, demos)
//! - `OpenAIChatModel` - OpenAI chat completions with tool calling

mod openai_chat;
mod scripted_model;

pub use openai_chat::{OpenAIChatConfig, OpenAIChatModel};
pub use scripted_model::{RecordedModelCall, ScriptedLanguageModel, EXHAUSTED_SCRIPT_REPLY};
