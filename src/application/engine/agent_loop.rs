//! The agent loop behind one engine session.
//!
//! `EngineCore` is registered on the bus as the session's `Prompt` handler.
//! Each prompt runs the tool-use cycle to completion:
//!
//! 1. Append the prompt as a user turn
//! 2. Call the model with the context snapshot and the tool schemas, then
//!    append its reply verbatim
//! 3. Without tool calls, finish: `Status(Finished)`, `PromptResponse`, success
//! 4. Otherwise dispatch every requested call in order and go back to 2
//!
//! Budget overruns, declined confirmations, and tool failures are recorded
//! as tool turns so the model can react. Only bus, context, and model
//! failures abort the prompt.

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Map, Value as JsonValue};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};

use super::error::EngineError;
use crate::adapters::bus::MessageBus;
use crate::config::EngineConfig;
use crate::domain::bus::{
    Command, CommandResult, ConfirmationCommand, EngineStatus, PromptResponseEvent, StatusEvent,
    ToolResultEvent,
};
use crate::domain::conversation::Turn;
use crate::domain::foundation::{panic_message, SessionId};
use crate::domain::tools::{
    invoke_tool, stringify_result, ConfirmationPolicy, EntityKind, LookupCache, ToolCallRequest,
    ToolCallResult, ToolRegistry,
};
use crate::ports::{CommandHandler, ConversationContext, LanguageModel, Tool, ToolExecutionError};

/// Tool turn recorded for every call past the per-prompt budget.
pub const BUDGET_EXHAUSTED_REPLY: &str = "The max number of tool calls has been reached. \
Please close this set of tool calls and inform the user. \
THIS CURRENT TOOL CALL WAS NOT SUCCESSFUL";

/// Tool turn recorded when the user declines a confirmation.
pub const DECLINED_REPLY: &str = "User purposefully denied tool execution, it was not \
successful, use this information in final response.";

/// Prefix of the tool turn recorded when a tool fails.
pub const TOOL_FAILURE_PREFIX: &str = "Tool execution failed:";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tool calls honored so far in one prompt cycle.
#[derive(Debug)]
struct ToolBudget {
    used: u32,
    limit: u32,
}

impl ToolBudget {
    fn new(limit: u32) -> Self {
        Self { used: 0, limit }
    }

    /// Counts one call. Returns false once the limit is exceeded.
    fn take(&mut self) -> bool {
        self.used = self.used.saturating_add(1);
        self.used <= self.limit
    }
}

/// Session-owned state and collaborators of the agent loop.
pub struct EngineCore {
    session_id: SessionId,
    bus: Arc<MessageBus>,
    model: Arc<dyn LanguageModel>,
    context: Arc<dyn ConversationContext>,
    registry: RwLock<ToolRegistry>,
    lookups: Mutex<LookupCache>,
    config: EngineConfig,
    in_flight: AsyncMutex<()>,
}

impl EngineCore {
    pub(super) fn new(
        session_id: SessionId,
        bus: Arc<MessageBus>,
        model: Arc<dyn LanguageModel>,
        context: Arc<dyn ConversationContext>,
        registry: ToolRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            session_id,
            bus,
            model,
            context,
            registry: RwLock::new(registry),
            lookups: Mutex::new(LookupCache::new()),
            config,
            in_flight: AsyncMutex::new(()),
        }
    }

    pub(super) fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub(super) fn context(&self) -> &Arc<dyn ConversationContext> {
        &self.context
    }

    pub(super) fn registry(&self) -> &RwLock<ToolRegistry> {
        &self.registry
    }

    pub(super) fn lookup_snapshot(&self, kind: &EntityKind) -> Option<Map<String, JsonValue>> {
        lock(&self.lookups).snapshot(kind)
    }

    async fn publish_status(&self, status: EngineStatus) -> Result<(), EngineError> {
        self.bus
            .publish(StatusEvent::new(self.session_id.clone(), status))
            .await?;
        Ok(())
    }

    /// Runs one prompt through the tool-use cycle.
    async fn run(&self, prompt: &str) -> Result<String, EngineError> {
        self.context.append(Turn::user(prompt)).await?;
        let mut budget = ToolBudget::new(self.config.max_tool_calls);

        for cycle in 1..=self.config.max_cycles {
            let snapshot = self.context.snapshot().await?;
            let tools = self.registry.read().await.definitions();

            self.publish_status(EngineStatus::CallingModel).await?;
            debug!(
                session_id = %self.session_id,
                cycle,
                turns = snapshot.len(),
                tools = tools.len(),
                "Calling model"
            );
            let response = self.model.generate(&snapshot, &tools).await?;
            self.context.append(response.to_turn()).await?;

            if !response.has_tool_calls() {
                let content = response.content.unwrap_or_default();
                self.publish_status(EngineStatus::Finished).await?;
                self.bus
                    .publish(PromptResponseEvent::new(
                        self.session_id.clone(),
                        prompt,
                        content.clone(),
                    ))
                    .await?;
                info!(session_id = %self.session_id, cycles = cycle, tool_calls = budget.used, "Prompt finished");
                return Ok(content);
            }

            for call in &response.tool_calls {
                self.dispatch(call, &mut budget).await?;
            }
        }

        Err(EngineError::CycleLimitExceeded(self.config.max_cycles))
    }

    /// Handles one requested tool call.
    async fn dispatch(&self, call: &ToolCallRequest, budget: &mut ToolBudget) -> Result<(), EngineError> {
        if !budget.take() {
            warn!(
                session_id = %self.session_id,
                tool = %call.name,
                call_id = %call.id,
                limit = budget.limit,
                "Tool budget exhausted, call not honored"
            );
            return self.record(call, BUDGET_EXHAUSTED_REPLY).await;
        }

        // The registry guard is released before the tool runs.
        let tool = self.registry.read().await.get(&call.name).cloned();
        let arguments = call.parse_arguments().map_err(ToolExecutionError::from);

        if let (Some(tool), Ok(arguments)) = (&tool, &arguments) {
            if let Some(policy) = tool.definition().confirmation() {
                if !self.confirm(tool.as_ref(), policy, arguments.clone()).await? {
                    info!(session_id = %self.session_id, tool = %call.name, call_id = %call.id, "Tool call declined");
                    return self.record(call, DECLINED_REPLY).await;
                }
            }
        }

        self.publish_status(EngineStatus::ExecutingTool {
            tool_name: call.name.clone(),
        })
        .await?;

        let outcome = match (&tool, arguments) {
            (None, _) => Err(ToolExecutionError::ToolNotFound(call.name.clone())),
            (Some(_), Err(e)) => Err(e),
            (Some(tool), Ok(arguments)) => invoke_tool(tool.as_ref(), arguments).await,
        };
        let content = match &outcome {
            Ok(value) => stringify_result(value),
            Err(e) => {
                warn!(session_id = %self.session_id, tool = %call.name, call_id = %call.id, "Tool failed: {}", e);
                failure_reply(e)
            }
        };

        self.record(call, &content).await?;
        self.bus
            .publish(ToolResultEvent::new(
                self.session_id.clone(),
                call.name.clone(),
                content,
            ))
            .await?;

        // A failed listing empties its partition.
        if let Some(kind) = tool.as_ref().and_then(|tool| tool.definition().listed_kind()) {
            let listing = outcome.unwrap_or(JsonValue::Null);
            lock(&self.lookups).replace(kind, &listing);
        }

        Ok(())
    }

    /// Asks for confirmation of a mutating call. Only an explicit `true` approves.
    async fn confirm(
        &self,
        tool: &dyn Tool,
        policy: &ConfirmationPolicy,
        arguments: JsonValue,
    ) -> Result<bool, EngineError> {
        let resolved = self.resolve_display_names(policy, arguments);
        let description = tool.describe(&resolved);
        debug!(session_id = %self.session_id, tool = tool.definition().name(), "Requesting confirmation: {}", description);

        let answer = self
            .bus
            .execute(ConfirmationCommand::new(self.session_id.clone(), description))
            .await?;
        Ok(answer.is_approved())
    }

    /// Replaces id-valued arguments with display names from the lookup cache.
    ///
    /// Ids missing from the cache are left as they are.
    fn resolve_display_names(&self, policy: &ConfirmationPolicy, mut arguments: JsonValue) -> JsonValue {
        if let Some(fields) = arguments.as_object_mut() {
            let cache = lock(&self.lookups);
            for lookup in &policy.lookups {
                let name = match fields.get(&lookup.argument) {
                    Some(JsonValue::String(id)) => cache.display_name(&lookup.kind, id),
                    _ => None,
                };
                if let Some(name) = name {
                    fields.insert(lookup.argument.clone(), JsonValue::String(name));
                }
            }
        }
        arguments
    }

    async fn record(&self, call: &ToolCallRequest, content: &str) -> Result<(), EngineError> {
        self.context
            .append(ToolCallResult::for_request(call, content).into())
            .await?;
        Ok(())
    }
}

fn failure_reply(error: &ToolExecutionError) -> String {
    format!("{} {}", TOOL_FAILURE_PREFIX, error)
}

#[async_trait]
impl CommandHandler for EngineCore {
    async fn handle(&self, command: Command) -> CommandResult {
        let prompt = match command {
            Command::Prompt(prompt) => prompt,
            other => {
                return CommandResult::failure(format!(
                    "{} only handles prompt commands, got {}",
                    self.name(),
                    other.kind()
                ))
            }
        };

        let _guard = self.in_flight.lock().await;

        let outcome = match AssertUnwindSafe(self.run(&prompt.prompt)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(EngineError::PromptFailed(format!(
                "agent loop panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        match outcome {
            Ok(content) => CommandResult::success(content),
            Err(e) => {
                warn!(session_id = %self.session_id, "Prompt failed: {}", e);
                if let Err(publish_err) = self.publish_status(EngineStatus::Finished).await {
                    warn!(session_id = %self.session_id, "Could not publish finished status: {}", publish_err);
                }
                CommandResult::failure(e.to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        "ToolUseEngine"
    }
}

impl std::fmt::Debug for EngineCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCore")
            .field("session_id", &self.session_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
