//! Closure-backed tool.
//!
//! Wraps an async function as a [`Tool`], so integrations can register a
//! tool without defining a type for it.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;

use crate::domain::tools::ToolDefinition;
use crate::ports::{Tool, ToolExecutionError};

type ToolFn = dyn Fn(JsonValue) -> BoxFuture<'static, Result<JsonValue, ToolExecutionError>>
    + Send
    + Sync;
type DescribeFn = dyn Fn(&JsonValue) -> String + Send + Sync;

/// A tool whose behavior is an async closure.
///
/// # Example
///
/// ```
/// use tool_loop_engine::adapters::tools::FunctionTool;
/// use tool_loop_engine::domain::tools::ToolDefinition;
///
/// let tool = FunctionTool::new(
///     ToolDefinition::parameterless("get_active_projects", "List projects").lists("project"),
///     |_args| async { Ok(serde_json::json!({"p1": "Apollo"})) },
/// );
/// ```
#[derive(Clone)]
pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Arc<ToolFn>,
    describe: Option<Arc<DescribeFn>>,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(JsonValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JsonValue, ToolExecutionError>> + Send + 'static,
    {
        Self {
            definition,
            handler: Arc::new(move |args| Box::pin(handler(args))),
            describe: None,
        }
    }

    /// Overrides the confirmation description.
    pub fn with_description<D>(mut self, describe: D) -> Self
    where
        D: Fn(&JsonValue) -> String + Send + Sync + 'static,
    {
        self.describe = Some(Arc::new(describe));
        self
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.definition.name())
            .finish()
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn call(&self, arguments: JsonValue) -> Result<JsonValue, ToolExecutionError> {
        (self.handler)(arguments).await
    }

    fn describe(&self, arguments: &JsonValue) -> String {
        match &self.describe {
            Some(describe) => describe(arguments),
            None => match self.definition.confirmation() {
                Some(policy) => format!("{} {}", policy.action, arguments),
                None => format!("{} {}", self.definition.name(), arguments),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::ConfirmationPolicy;
    use serde_json::json;

    #[tokio::test]
    async fn call_runs_the_closure() {
        let tool = FunctionTool::new(ToolDefinition::parameterless("double", "x2"), |args| async move {
            let n = args["n"].as_i64().ok_or_else(|| ToolExecutionError::invalid_arguments("n"))?;
            Ok::<_, ToolExecutionError>(json!(n * 2))
        });

        assert_eq!(tool.call(json!({"n": 21})).await.unwrap(), json!(42));
        assert!(tool.call(json!({})).await.is_err());
    }

    #[test]
    fn default_description_uses_policy_action() {
        let tool = FunctionTool::new(
            ToolDefinition::parameterless("create_task", "Create")
                .with_confirmation(ConfirmationPolicy::new("Creating task")),
            |_| async { Ok(JsonValue::Null) },
        );

        assert_eq!(tool.describe(&json!({"a": 1})), r#"Creating task {"a":1}"#);
    }

    #[test]
    fn custom_description_overrides_default() {
        let tool = FunctionTool::new(ToolDefinition::parameterless("create_task", "Create"), |_| async {
            Ok(JsonValue::Null)
        })
        .with_description(|args| format!("Create '{}'?", args["name"].as_str().unwrap_or("?")));

        assert_eq!(tool.describe(&json!({"name": "Fix bug"})), "Create 'Fix bug'?");
    }
}
