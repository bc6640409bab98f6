//! Agent loop configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Honored tool calls per prompt before further calls are refused.
pub const DEFAULT_MAX_TOOL_CALLS: u32 = 10;

/// Model calls per prompt before the cycle is aborted.
pub const DEFAULT_MAX_CYCLES: u32 = 25;

/// Seconds a confirmation waits for an answer before counting as declined.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 60;

/// Agent loop configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Tool call budget per prompt
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,

    /// Model call limit per prompt
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,

    /// Confirmation timeout in seconds
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// System prompt installed on new engine sessions
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl EngineConfig {
    /// Get confirmation timeout as Duration
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Sets the tool call budget.
    pub fn with_max_tool_calls(mut self, max_tool_calls: u32) -> Self {
        self.max_tool_calls = max_tool_calls;
        self
    }

    /// Sets the model call limit.
    pub fn with_max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_tool_calls == 0 {
            return Err(ValidationError::InvalidToolBudget);
        }
        if self.max_cycles == 0 {
            return Err(ValidationError::InvalidCycleLimit);
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("confirmation_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: default_max_tool_calls(),
            max_cycles: default_max_cycles(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            system_prompt: None,
        }
    }
}

fn default_max_tool_calls() -> u32 {
    DEFAULT_MAX_TOOL_CALLS
}

fn default_max_cycles() -> u32 {
    DEFAULT_MAX_CYCLES
}

fn default_confirmation_timeout() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_tool_calls, 10);
        assert_eq!(config.max_cycles, 25);
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(60));
        assert!(config.system_prompt.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = EngineConfig::default().with_max_tool_calls(0);
        assert_eq!(config.validate(), Err(ValidationError::InvalidToolBudget));
    }

    #[test]
    fn test_zero_cycles_rejected() {
        let config = EngineConfig::default().with_max_cycles(0);
        assert_eq!(config.validate(), Err(ValidationError::InvalidCycleLimit));
    }

    #[test]
    fn test_zero_confirmation_timeout_rejected() {
        let config = EngineConfig {
            confirmation_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeout(_))));
    }
}
