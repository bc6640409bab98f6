//! Tools - tool-call requests, definitions, the registry, and the lookup cache.
//!
//! ## Key Types
//!
//! - [`ToolCallRequest`] - Model's request to invoke a tool
//! - [`ToolCallResult`] - Recorded outcome of one call
//! - [`ToolDefinition`] - Schema plus confirmation/listing attributes
//! - [`ToolRegistry`] - Name-indexed tools of one engine session
//! - [`LookupCache`] - Listing-tool output used to name ids in confirmations

mod lookup_cache;
mod tool_call;
mod tool_definition;
mod tool_registry;

pub use lookup_cache::LookupCache;
pub use tool_call::{stringify_result, ToolCallRequest, ToolCallResult};
pub use tool_definition::{ArgumentLookup, ConfirmationPolicy, EntityKind, ToolDefinition};
pub use tool_registry::{invoke_tool, ToolRegistry, ToolRegistryError};
