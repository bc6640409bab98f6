//! Tool Registry - the tools one engine session offers to the model.
//!
//! Tools are kept in registration order; that order is the order their
//! schemas are sent to the model.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tool_loop_engine::adapters::tools::FunctionTool;
//! use tool_loop_engine::domain::tools::{ToolDefinition, ToolRegistry};
//!
//! let mut registry = ToolRegistry::new();
//! registry
//!     .register(Arc::new(FunctionTool::new(
//!         ToolDefinition::parameterless("get_active_tasks", "List open tasks").lists("task"),
//!         |_args| async { Ok(serde_json::json!({})) },
//!     )))
//!     .unwrap();
//!
//! assert!(registry.has_tool("get_active_tasks"));
//! ```

use futures::FutureExt;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

use super::{ToolCallRequest, ToolDefinition};
use crate::domain::foundation::panic_message;
use crate::ports::{Tool, ToolExecutionError};

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolRegistryError {
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}

/// Name-indexed set of tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its definition's name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolRegistryError> {
        let name = tool.definition().name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ToolRegistryError::DuplicateTool(name));
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).and_then(|&idx| self.tools.get(idx))
    }

    /// Gets a tool definition by name.
    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.get(name).map(|tool| tool.definition())
    }

    /// Checks if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition().clone()).collect()
    }

    /// All schemas in OpenAI function-calling format.
    pub fn openai_schemas(&self) -> Vec<JsonValue> {
        self.tools
            .iter()
            .map(|tool| tool.definition().to_openai_format())
            .collect()
    }

    /// Names of all tools, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.definition().name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Parses the call's arguments and invokes the named tool.
    pub async fn execute(&self, call: &ToolCallRequest) -> Result<JsonValue, ToolExecutionError> {
        let tool = self
            .get(&call.name)
            .cloned()
            .ok_or_else(|| ToolExecutionError::ToolNotFound(call.name.clone()))?;
        let arguments = call.parse_arguments()?;
        invoke_tool(tool.as_ref(), arguments).await
    }
}

/// Calls `tool`, turning a panic inside it into a [`ToolExecutionError::SystemError`].
pub async fn invoke_tool(tool: &dyn Tool, arguments: JsonValue) -> Result<JsonValue, ToolExecutionError> {
    match AssertUnwindSafe(tool.call(arguments)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(ToolExecutionError::system(format!(
            "{} panicked: {}",
            tool.definition().name(),
            panic_message(panic.as_ref())
        ))),
    }
}
