//! Engine error types.

use thiserror::Error;

use crate::config::ValidationError as ConfigValidationError;
use crate::domain::bus::BusError;
use crate::domain::foundation::DomainError;
use crate::domain::tools::ToolRegistryError;
use crate::ports::AIError;

/// Errors raised while building or driving an engine session.
///
/// Inside the agent loop these abort the current prompt and surface as a
/// failed `CommandResult`. Tool-level failures never become an `EngineError`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Routing, registration, or lifecycle failure on the bus
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// Tool registration failed
    #[error("Tool registry error: {0}")]
    Registry(#[from] ToolRegistryError),

    /// The conversation context could not be read or written
    #[error("Context error: {0}")]
    Context(#[from] DomainError),

    /// The model call failed
    #[error("Model error: {0}")]
    Model(#[from] AIError),

    /// The model was still requesting tools after the cycle limit
    #[error("Model kept requesting tools after {0} model calls")]
    CycleLimitExceeded(u32),

    /// Engine configuration rejected at build time
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// The prompt handler answered with a failed result
    #[error("Failed to process message: {0}")]
    PromptFailed(String),
}
