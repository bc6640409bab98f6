//! Tool definition - schema and declarative metadata for a tool.
//!
//! Besides the schema sent to the model, a definition carries two
//! attributes the agent loop reacts to:
//!
//! - [`ConfirmationPolicy`] marks a tool as state-mutating. The loop asks a
//!   human before every call.
//! - `lists` marks a tool as a listing tool. Its result replaces the lookup
//!   cache entry for that [`EntityKind`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of external entity a listing tool enumerates (e.g. `task`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// An argument whose value is an external id that should be shown to the
/// user by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentLookup {
    /// Argument field holding the id.
    pub argument: String,
    /// Cache partition the id is resolved against.
    pub kind: EntityKind,
}

impl ArgumentLookup {
    pub fn new(argument: impl Into<String>, kind: impl Into<EntityKind>) -> Self {
        Self {
            argument: argument.into(),
            kind: kind.into(),
        }
    }
}

/// Requires human approval before the tool runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPolicy {
    /// Verb phrase that opens the confirmation text (e.g. "Creating task").
    pub action: String,
    /// Id arguments to translate before showing them.
    #[serde(default)]
    pub lookups: Vec<ArgumentLookup>,
}

impl ConfirmationPolicy {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            lookups: Vec::new(),
        }
    }

    /// Adds an id argument to resolve through the lookup cache.
    pub fn with_lookup(mut self, argument: impl Into<String>, kind: impl Into<EntityKind>) -> Self {
        self.lookups.push(ArgumentLookup::new(argument, kind));
        self
    }
}

/// Definition of a tool the model can invoke.
///
/// # Examples
///
/// ```
/// use tool_loop_engine::domain::tools::{ConfirmationPolicy, ToolDefinition};
///
/// let definition = ToolDefinition::new(
///     "update_task",
///     "Update an existing task",
///     serde_json::json!({
///         "type": "object",
///         "required": ["task_id"],
///         "properties": {
///             "task_id": { "type": "string" },
///             "status": { "type": "string" }
///         }
///     }),
/// )
/// .with_confirmation(ConfirmationPolicy::new("Updating task").with_lookup("task_id", "task"));
///
/// assert!(definition.requires_confirmation());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters_schema: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confirmation: Option<ConfirmationPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lists: Option<EntityKind>,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
            confirmation: None,
            lists: None,
        }
    }

    /// Creates a tool definition that takes no parameters.
    pub fn parameterless(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            serde_json::json!({"type": "object", "properties": {}}),
        )
    }

    /// Marks the tool as state-mutating.
    pub fn with_confirmation(mut self, policy: ConfirmationPolicy) -> Self {
        self.confirmation = Some(policy);
        self
    }

    /// Marks the tool as the listing tool for `kind`.
    pub fn lists(mut self, kind: impl Into<EntityKind>) -> Self {
        self.lists = Some(kind.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters_schema(&self) -> &serde_json::Value {
        &self.parameters_schema
    }

    pub fn confirmation(&self) -> Option<&ConfirmationPolicy> {
        self.confirmation.as_ref()
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirmation.is_some()
    }

    /// Entity kind this tool enumerates, if it is a listing tool.
    pub fn listed_kind(&self) -> Option<&EntityKind> {
        self.lists.as_ref()
    }

    /// Converts to OpenAI tool format.
    ///
    /// Only the model-facing fields are included.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "user_id": { "type": "string" }
            }
        })
    }

    #[test]
    fn plain_definition_has_no_attributes() {
        let def = ToolDefinition::new("get_weather", "Weather lookup", task_schema());

        assert!(!def.requires_confirmation());
        assert!(def.listed_kind().is_none());
        assert_eq!(def.name(), "get_weather");
    }

    #[test]
    fn confirmation_policy_collects_lookups_in_order() {
        let policy = ConfirmationPolicy::new("Creating task")
            .with_lookup("user_id", "user")
            .with_lookup("project_id", "project");

        assert_eq!(policy.lookups.len(), 2);
        assert_eq!(policy.lookups[0].argument, "user_id");
        assert_eq!(policy.lookups[1].kind, EntityKind::new("project"));
    }

    #[test]
    fn listing_tool_declares_kind() {
        let def = ToolDefinition::parameterless("get_active_tasks", "List tasks").lists("task");
        assert_eq!(def.listed_kind(), Some(&EntityKind::new("task")));
    }

    #[test]
    fn openai_format_omits_engine_attributes() {
        let def = ToolDefinition::new("create_task", "Create a task", task_schema())
            .with_confirmation(ConfirmationPolicy::new("Creating task"));

        let format = def.to_openai_format();
        assert_eq!(format["type"], "function");
        assert_eq!(format["function"]["name"], "create_task");
        assert_eq!(format["function"]["parameters"], task_schema());
        assert!(format["function"].get("confirmation").is_none());
    }

    #[test]
    fn parameterless_schema_is_empty_object() {
        let def = ToolDefinition::parameterless("get_active_projects", "List projects");
        assert_eq!(def.parameters_schema()["type"], "object");
        assert_eq!(def.parameters_schema()["properties"], json!({}));
    }
}
