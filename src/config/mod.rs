//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! (and optionally a file) using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `TOOL_ENGINE` prefix and nested values use `__` as separator.
//!
//! # Example
//!
//! ```no_run
//! use tool_loop_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Tool budget: {}", config.engine.max_tool_calls);
//! ```

mod engine;
mod error;
mod logging;
mod model;

pub use engine::{
    EngineConfig, DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_MAX_CYCLES, DEFAULT_MAX_TOOL_CALLS,
};
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use model::ModelConfig;

use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "TOOL_ENGINE";
const ENV_SEPARATOR: &str = "__";

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a usable
/// configuration apart from the model API key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Agent loop limits and defaults
    #[serde(default)]
    pub engine: EngineConfig,

    /// Language model client
    #[serde(default)]
    pub model: ModelConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TOOL_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TOOL_ENGINE__ENGINE__MAX_TOOL_CALLS=5` -> `engine.max_tool_calls = 5`
    /// - `TOOL_ENGINE__MODEL__API_KEY=...` -> `model.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load configuration from a file, then apply environment overrides.
    ///
    /// The format follows the file extension (`.toml`, `.json`, `.yaml`, ...).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or malformed, or values
    /// cannot be parsed into expected types.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.model.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::default()
        .prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
}
