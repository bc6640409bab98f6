//! In-memory chat history.
//!
//! The default [`ConversationContext`] store. Nothing is persisted; the
//! history lives as long as the engine session holding it.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::conversation::Turn;
use crate::domain::foundation::DomainError;
use crate::ports::ConversationContext;

#[derive(Debug, Default)]
struct History {
    system_prompt: Option<String>,
    turns: Vec<Turn>,
}

/// Chat history kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryChatHistory {
    inner: RwLock<History>,
}

impl InMemoryChatHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history with a system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(History {
                system_prompt: Some(prompt.into()),
                turns: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl ConversationContext for InMemoryChatHistory {
    async fn append(&self, turn: Turn) -> Result<(), DomainError> {
        self.inner.write().await.turns.push(turn);
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<Turn>, DomainError> {
        let history = self.inner.read().await;
        let mut turns = Vec::with_capacity(history.turns.len() + 1);
        if let Some(prompt) = &history.system_prompt {
            turns.push(Turn::system(prompt.clone()));
        }
        turns.extend(history.turns.iter().cloned());
        Ok(turns)
    }

    async fn set_system_prompt(&self, prompt: String) -> Result<(), DomainError> {
        self.inner.write().await.system_prompt = Some(prompt);
        Ok(())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.inner.write().await.turns.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self.inner.read().await.turns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_preserves_append_order() {
        let history = InMemoryChatHistory::new();
        history.append(Turn::user("one")).await.unwrap();
        history.append(Turn::assistant("two")).await.unwrap();

        let snapshot = history.snapshot().await.unwrap();
        assert_eq!(snapshot, vec![Turn::user("one"), Turn::assistant("two")]);
    }

    #[tokio::test]
    async fn system_prompt_leads_snapshot() {
        let history = InMemoryChatHistory::with_system_prompt("Be brief");
        history.append(Turn::user("hi")).await.unwrap();

        let snapshot = history.snapshot().await.unwrap();
        assert_eq!(snapshot[0], Turn::system("Be brief"));
        assert_eq!(history.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_system_prompt_replaces_previous() {
        let history = InMemoryChatHistory::with_system_prompt("old");
        history.set_system_prompt("new".into()).await.unwrap();

        let snapshot = history.snapshot().await.unwrap();
        assert_eq!(snapshot, vec![Turn::system("new")]);
    }

    #[tokio::test]
    async fn clear_keeps_system_prompt() {
        let history = InMemoryChatHistory::with_system_prompt("rules");
        history.append(Turn::user("hi")).await.unwrap();
        history.clear().await.unwrap();

        assert_eq!(history.len().await.unwrap(), 0);
        assert_eq!(history.snapshot().await.unwrap(), vec![Turn::system("rules")]);
    }

    #[tokio::test]
    async fn snapshot_is_a_copy() {
        let history = InMemoryChatHistory::new();
        history.append(Turn::user("a")).await.unwrap();
        let before = history.snapshot().await.unwrap();

        history.append(Turn::user("b")).await.unwrap();
        assert_eq!(before.len(), 1);
    }
}
