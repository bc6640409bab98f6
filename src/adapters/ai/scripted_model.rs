//! Scripted language model for testing.
//!
//! Plays back a queue of pre-configured replies, allowing the agent loop
//! to be exercised without calling a real model API.
//!
//! # Features
//!
//! - Pre-configured replies (text or tool-call batches)
//! - Error injection for failure-path testing
//! - Simulated latency
//! - Call recording (context snapshot and offered tools) for verification
//!
//! # Example
//!
//! ```ignore
//! let model = ScriptedLanguageModel::new()
//!     .with_tool_calls(vec![ToolCallRequest::new("c1", "get_active_tasks", "{}")])
//!     .with_text("You have two open tasks.");
//!
//! let reply = model.generate(&context, &tools).await?;
//! assert!(reply.has_tool_calls());
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::conversation::Turn;
use crate::domain::tools::{ToolCallRequest, ToolDefinition};
use crate::ports::{AIError, LanguageModel, ModelResponse, ProviderInfo};

/// Reply given once the script runs out.
pub const EXHAUSTED_SCRIPT_REPLY: &str = "Scripted response";

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedModelCall {
    /// Context snapshot exactly as handed to the model.
    pub context: Vec<Turn>,
    /// Names of the tools offered, in order.
    pub tools: Vec<String>,
}

/// Language model that replays a script.
#[derive(Debug, Clone)]
pub struct ScriptedLanguageModel {
    /// Replies, consumed in order.
    replies: Arc<Mutex<VecDeque<Result<ModelResponse, AIError>>>>,
    info: ProviderInfo,
    delay: Duration,
    calls: Arc<Mutex<Vec<RecordedModelCall>>>,
}

impl Default for ScriptedLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedLanguageModel {
    /// Creates a model with an empty script.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("scripted", "scripted-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a final text reply.
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.with_response(ModelResponse::text(content))
    }

    /// Queues a reply requesting `calls`.
    pub fn with_tool_calls(self, calls: Vec<ToolCallRequest>) -> Self {
        self.with_response(ModelResponse::requesting(calls))
    }

    /// Queues an arbitrary reply.
    pub fn with_response(self, response: ModelResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(Err(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Appends to the script after construction.
    pub fn push(&self, reply: Result<ModelResponse, AIError>) {
        lock(&self.replies).push_back(reply);
    }

    /// Number of replies still queued.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }

    /// Returns the number of calls made to this model.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<RecordedModelCall> {
        lock(&self.calls).clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_reply(&self) -> Result<ModelResponse, AIError> {
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok(ModelResponse::text(EXHAUSTED_SCRIPT_REPLY)))
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn generate(
        &self,
        context: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AIError> {
        lock(&self.calls).push(RecordedModelCall {
            context: context.to_vec(),
            tools: tools.iter().map(|t| t.name().to_string()).collect(),
        });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.next_reply()
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
