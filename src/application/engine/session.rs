//! Engine session: one conversation, one tool registry, one lookup cache,
//! and the `Prompt` handler registered for its session on the bus.

use serde_json::{Map, Value as JsonValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::agent_loop::EngineCore;
use super::error::EngineError;
use crate::adapters::bus::MessageBus;
use crate::adapters::history::InMemoryChatHistory;
use crate::config::EngineConfig;
use crate::domain::bus::{CommandKind, PromptCommand};
use crate::domain::conversation::{Role, Turn};
use crate::domain::foundation::{SessionId, SessionScope};
use crate::domain::tools::{EntityKind, ToolRegistry};
use crate::ports::{ConversationContext, LanguageModel, Tool};

/// A tool-using chat engine bound to one session.
///
/// Prompts are processed through the bus, so front ends may either call
/// [`process`](Self::process) or execute a [`PromptCommand`] for the session
/// themselves. Dropping the engine retires it.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tool_loop_engine::adapters::ai::ScriptedLanguageModel;
/// use tool_loop_engine::adapters::bus::MessageBus;
/// use tool_loop_engine::application::engine::ToolUseEngine;
/// use tool_loop_engine::domain::foundation::SessionId;
///
/// # async fn run() -> Result<(), tool_loop_engine::application::engine::EngineError> {
/// let bus = Arc::new(MessageBus::new());
/// bus.start();
///
/// let model = Arc::new(ScriptedLanguageModel::new().with_text("Hello!"));
/// let engine = ToolUseEngine::builder(SessionId::new(), bus, model)
///     .with_system_prompt("You manage tasks.")
///     .build()
///     .await?;
///
/// let reply = engine.process("hi").await?;
/// assert_eq!(reply, "Hello!");
/// # Ok(())
/// # }
/// ```
pub struct ToolUseEngine {
    core: Arc<EngineCore>,
    bus: Arc<MessageBus>,
    retired: AtomicBool,
}

impl ToolUseEngine {
    /// Starts building an engine for `session_id`.
    pub fn builder(
        session_id: SessionId,
        bus: Arc<MessageBus>,
        model: Arc<dyn LanguageModel>,
    ) -> ToolUseEngineBuilder {
        ToolUseEngineBuilder {
            session_id,
            bus,
            model,
            context: None,
            system_prompt: None,
            config: EngineConfig::default(),
            tools: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        self.core.session_id()
    }

    /// Processes `prompt` and returns the model's final text.
    ///
    /// # Errors
    ///
    /// - `Bus` if the bus is stopped or the engine was retired
    /// - `PromptFailed` if the agent loop failed
    pub async fn process(&self, prompt: impl Into<String>) -> Result<String, EngineError> {
        let result = self
            .bus
            .execute(PromptCommand::new(self.session_id().clone(), prompt))
            .await?;

        if !result.is_success() {
            return Err(EngineError::PromptFailed(
                result.error().unwrap_or("unknown error").to_string(),
            ));
        }

        Ok(result.result_text().unwrap_or_default().to_string())
    }

    /// Adds a tool for subsequent model calls.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) -> Result<(), EngineError> {
        let name = tool.definition().name().to_string();
        self.core.registry().write().await.register(tool)?;
        debug!(session_id = %self.session_id(), tool = %name, "Tool registered");
        Ok(())
    }

    /// Names of the registered tools, in registration order.
    pub async fn tool_names(&self) -> Vec<String> {
        let registry = self.core.registry().read().await;
        registry.tool_names().into_iter().map(String::from).collect()
    }

    /// Forgets the conversation. The system prompt and lookup cache are kept.
    pub async fn clear_context(&self) -> Result<(), EngineError> {
        self.core.context().clear().await?;
        Ok(())
    }

    pub async fn set_system_prompt(&self, prompt: impl Into<String>) -> Result<(), EngineError> {
        self.core.context().set_system_prompt(prompt.into()).await?;
        Ok(())
    }

    /// Appends a plain-text turn outside of any prompt cycle.
    pub async fn add_context(&self, text: impl Into<String>, role: Role) -> Result<(), EngineError> {
        self.core.context().append(Turn::from_role(role, text)).await?;
        Ok(())
    }

    /// Current conversation, system prompt first.
    pub async fn context_snapshot(&self) -> Result<Vec<Turn>, EngineError> {
        Ok(self.core.context().snapshot().await?)
    }

    /// Entries cached by the last listing of `kind`, if any.
    pub fn lookup_cache_snapshot(&self, kind: &EntityKind) -> Option<Map<String, JsonValue>> {
        self.core.lookup_snapshot(kind)
    }

    /// Removes the engine's `Prompt` handler from the bus. Idempotent.
    pub fn retire(&self) {
        if self.retired.swap(true, Ordering::SeqCst) {
            return;
        }
        let scope = SessionScope::from(self.session_id());
        if self.bus.unregister_command_handler(CommandKind::Prompt, &scope) {
            info!(session_id = %self.session_id(), "Engine retired");
        }
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }
}

impl Drop for ToolUseEngine {
    fn drop(&mut self) {
        self.retire();
    }
}

impl std::fmt::Debug for ToolUseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolUseEngine")
            .field("core", &self.core)
            .field("retired", &self.is_retired())
            .finish()
    }
}

/// Builder for [`ToolUseEngine`].
pub struct ToolUseEngineBuilder {
    session_id: SessionId,
    bus: Arc<MessageBus>,
    model: Arc<dyn LanguageModel>,
    context: Option<Arc<dyn ConversationContext>>,
    system_prompt: Option<String>,
    config: EngineConfig,
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolUseEngineBuilder {
    /// Sets the system prompt, overriding `EngineConfig::system_prompt`.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `context` instead of a fresh in-memory history.
    pub fn with_context(mut self, context: Arc<dyn ConversationContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Builds the engine and registers its `Prompt` handler on the bus.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the engine configuration is rejected
    /// - `Registry` on duplicate tool names
    /// - `Bus` if the session already has a `Prompt` handler
    pub async fn build(self) -> Result<ToolUseEngine, EngineError> {
        self.config.validate()?;

        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            registry.register(tool)?;
        }

        let context: Arc<dyn ConversationContext> = match self.context {
            Some(context) => context,
            None => Arc::new(InMemoryChatHistory::new()),
        };
        if let Some(prompt) = self.system_prompt.or_else(|| self.config.system_prompt.clone()) {
            context.set_system_prompt(prompt).await?;
        }

        let tool_count = registry.len();
        let core = Arc::new(EngineCore::new(
            self.session_id.clone(),
            Arc::clone(&self.bus),
            self.model,
            context,
            registry,
            self.config,
        ));

        self.bus.register_command_handler(
            CommandKind::Prompt,
            core.clone(),
            SessionScope::from(&self.session_id),
        )?;
        info!(session_id = %self.session_id, tools = tool_count, "Engine registered");

        Ok(ToolUseEngine {
            core,
            bus: self.bus,
            retired: AtomicBool::new(false),
        })
    }
}
