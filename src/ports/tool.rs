//! Tool Port - Interface for a callable tool offered to the model.
//!
//! A tool pairs its [`ToolDefinition`] (schema plus confirmation/listing
//! attributes) with the code that runs it.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct GetActiveTasks { /* client */ }
//!
//! #[async_trait]
//! impl Tool for GetActiveTasks {
//!     fn definition(&self) -> &ToolDefinition { &self.definition }
//!
//!     async fn call(&self, _arguments: JsonValue) -> Result<JsonValue, ToolExecutionError> {
//!         // query the task tracker
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::domain::tools::ToolDefinition;

/// Port for a single tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema and attributes of this tool.
    fn definition(&self) -> &ToolDefinition;

    /// Run the tool with parsed arguments.
    async fn call(&self, arguments: JsonValue) -> Result<JsonValue, ToolExecutionError>;

    /// Human-readable description of a pending call, shown when asking for
    /// confirmation.
    ///
    /// `arguments` already has id fields replaced by display names. The
    /// default is the policy's action followed by the arguments as JSON.
    fn describe(&self, arguments: &JsonValue) -> String {
        match self.definition().confirmation() {
            Some(policy) => format!("{} {}", policy.action, arguments),
            None => format!("{} {}", self.definition().name(), arguments),
        }
    }
}

/// Errors that can occur during tool execution.
#[derive(Debug, Clone, Error)]
pub enum ToolExecutionError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments were not valid JSON or did not match the tool's expectations
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Domain error during execution
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),

    /// The tool's backing system failed
    #[error("System error: {0}")]
    SystemError(String),
}

impl ToolExecutionError {
    /// Creates an invalid arguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// Creates a system error.
    pub fn system(message: impl Into<String>) -> Self {
        Self::SystemError(message.into())
    }
}

impl From<serde_json::Error> for ToolExecutionError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}
