//! Domain layer containing the bus vocabulary and tool-use types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (session ids, scopes, timestamps, errors)
//! - `bus` - Commands, events, results, and bus errors
//! - `conversation` - Turns that make up a model conversation
//! - `tools` - Tool calls, definitions, registry, and the lookup cache

pub mod bus;
pub mod conversation;
pub mod foundation;
pub mod tools;
