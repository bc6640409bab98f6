//! Conversation context port - the chat history one engine session keeps.
//!
//! The store owns the ordered turns plus an optional system prompt. A
//! snapshot always starts with the system prompt (when set) followed by the
//! turns in append order.

use async_trait::async_trait;

use crate::domain::conversation::Turn;
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait ConversationContext: Send + Sync {
    /// Append one turn to the history.
    async fn append(&self, turn: Turn) -> Result<(), DomainError>;

    /// Ordered copy of the history as it should be sent to the model.
    async fn snapshot(&self) -> Result<Vec<Turn>, DomainError>;

    /// Replace the system prompt.
    async fn set_system_prompt(&self, prompt: String) -> Result<(), DomainError>;

    /// Drop every turn. The system prompt is kept.
    async fn clear(&self) -> Result<(), DomainError>;

    /// Number of stored turns, excluding the system prompt.
    async fn len(&self) -> Result<usize, DomainError>;
}
