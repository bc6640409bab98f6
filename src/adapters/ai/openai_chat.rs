//! OpenAI Chat Model - LanguageModel implementation over the chat completions API.
//!
//! Sends the full turn history plus the registered tool schemas, and maps the
//! reply's `tool_calls` back to [`ToolCallRequest`]s. Argument strings are
//! passed through untouched in both directions.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIChatConfig::new(api_key)
//!     .with_model("gpt-4.1-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let model = OpenAIChatModel::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ModelConfig;
use crate::domain::conversation::Turn;
use crate::domain::tools::{ToolCallRequest, ToolDefinition};
use crate::ports::{AIError, LanguageModel, ModelResponse, ProviderInfo};

/// Configuration for the OpenAI chat model.
#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4.1-mini").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenAIChatConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4.1-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl From<&ModelConfig> for OpenAIChatConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            api_key: Secret::new(config.api_key.expose_secret().clone()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            max_retries: config.max_retries,
        }
    }
}

/// OpenAI chat completions client with tool calling.
pub struct OpenAIChatModel {
    config: OpenAIChatConfig,
    client: Client,
}

impl OpenAIChatModel {
    /// Creates a new model client.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: OpenAIChatConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_openai_request(&self, context: &[Turn], tools: &[ToolDefinition]) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: context.iter().map(OpenAIMessage::from_turn).collect(),
            tools: tools.iter().map(ToolDefinition::to_openai_format).collect(),
        }
    }

    async fn send_request(&self, request: &OpenAIRequest) -> Result<Response, AIError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(parse_retry_after(&error_body))),
            400 => {
                if error_body.contains("maximum context length")
                    || error_body.contains("context_length_exceeded")
                {
                    Err(AIError::ContextTooLong(error_body))
                } else {
                    Err(AIError::InvalidRequest(error_body))
                }
            }
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn attempt(&self, request: &OpenAIRequest) -> Result<ModelResponse, AIError> {
        let response = self.send_request(request).await?;
        let response = self.handle_response_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| AIError::network(format!("Failed to read response: {}", e)))?;
        parse_completion(&body)
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    async fn generate(
        &self,
        context: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AIError> {
        let request = self.to_openai_request(context, tools);
        let mut retry_count = 0;

        loop {
            match self.attempt(&request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    tracing::warn!(
                        model = %self.config.model,
                        attempt = retry_count + 1,
                        "OpenAI request failed, retrying: {}",
                        err
                    );
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count.min(6));
            sleep(delay).await;
            retry_count += 1;
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model)
    }
}

/// Parses retry-after from an error response, defaulting to 30 seconds.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|parsed| {
            let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
            let idx = message.find("try again in ")?;
            let rest = &message[idx + 13..];
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        })
        .unwrap_or(30)
}

/// Parses a chat completion body into a model response.
fn parse_completion(body: &str) -> Result<ModelResponse, AIError> {
    let openai_response: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

    let choice = openai_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AIError::parse("No choices in response"))?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(AIError::content_filtered("completion stopped by content filter"));
    }

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCallRequest::new(call.id, call.function.name, call.function.arguments))
        .collect();

    Ok(ModelResponse {
        content: choice.message.content,
        tool_calls,
    })
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn from_turn(turn: &Turn) -> Self {
        match turn {
            Turn::System { content } => Self::text("system", content),
            Turn::User { content } => Self::text("user", content),
            Turn::Assistant {
                content,
                tool_calls,
            } => Self {
                role: "assistant".to_string(),
                content: content.clone(),
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls.iter().map(OpenAIToolCall::from_request).collect())
                },
                tool_call_id: None,
            },
            Turn::Tool(result) => Self {
                role: "tool".to_string(),
                content: Some(result.content.clone()),
                tool_calls: None,
                tool_call_id: Some(result.tool_call_id.clone()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl OpenAIToolCall {
    fn from_request(request: &ToolCallRequest) -> Self {
        Self {
            id: request.id.clone(),
            call_type: function_type(),
            function: OpenAIFunctionCall {
                name: request.name.clone(),
                arguments: request.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::ToolCallResult;
    use serde_json::json;

    #[test]
    fn config_builder_works() {
        let config = OpenAIChatConfig::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_from_model_section_trims_trailing_slash() {
        let section = ModelConfig {
            base_url: "https://proxy.local/v1/".to_string(),
            ..ModelConfig::default()
        };
        let config = OpenAIChatConfig::from(&section);
        assert_eq!(config.base_url, "https://proxy.local/v1");
        assert_eq!(config.model, section.model);
    }

    #[test]
    fn turns_map_to_openai_roles() {
        let call = ToolCallRequest::new("call_1", "get_active_tasks", r#"{ }"#);
        let turns = vec![
            Turn::system("Be brief"),
            Turn::user("What is open?"),
            Turn::Assistant {
                content: None,
                tool_calls: vec![call.clone()],
            },
            Turn::Tool(ToolCallResult::for_request(&call, "{}")),
        ];

        let messages: Vec<_> = turns.iter().map(OpenAIMessage::from_turn).collect();
        let json = serde_json::to_value(&messages).unwrap();

        assert_eq!(json[0], json!({"role": "system", "content": "Be brief"}));
        assert_eq!(json[1]["role"], "user");
        assert_eq!(json[2]["role"], "assistant");
        assert_eq!(json[2]["content"], serde_json::Value::Null);
        assert_eq!(json[2]["tool_calls"][0]["type"], "function");
        assert_eq!(json[2]["tool_calls"][0]["function"]["arguments"], "{ }");
        assert_eq!(json[3], json!({"role": "tool", "content": "{}", "tool_call_id": "call_1"}));
    }

    #[test]
    fn request_omits_tools_when_none_registered() {
        let model = OpenAIChatModel::new(OpenAIChatConfig::new("k")).unwrap();
        let request = model.to_openai_request(&[Turn::user("hi")], &[]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4.1-mini");
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn request_includes_tool_schemas() {
        let model = OpenAIChatModel::new(OpenAIChatConfig::new("k")).unwrap();
        let tools = vec![ToolDefinition::parameterless("get_active_tasks", "List tasks")];
        let request = model.to_openai_request(&[Turn::user("hi")], &tools);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["tools"][0]["function"]["name"], "get_active_tasks");
    }

    #[test]
    fn parse_completion_reads_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"},"finish_reason":"stop"}]}"#;
        let response = parse_completion(body).unwrap();

        assert_eq!(response.content.as_deref(), Some("Hello"));
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn parse_completion_reads_tool_calls_verbatim() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null,"tool_calls":[
            {"id":"call_a","type":"function","function":{"name":"create_task","arguments":"{\"name\": \"Fix bug\"}"}}
        ]},"finish_reason":"tool_calls"}]}"#;
        let response = parse_completion(body).unwrap();

        assert!(response.content.is_none());
        assert_eq!(
            response.tool_calls,
            vec![ToolCallRequest::new("call_a", "create_task", r#"{"name": "Fix bug"}"#)]
        );
    }

    #[test]
    fn parse_completion_without_choices_fails() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, AIError::Parse(_)));
    }

    #[test]
    fn parse_completion_flags_content_filter() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":""},"finish_reason":"content_filter"}]}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(matches!(err, AIError::ContentFiltered { .. }));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12 seconds."}}"#;
        assert_eq!(parse_retry_after(error), 12);
    }

    #[test]
    fn parse_retry_after_default() {
        assert_eq!(parse_retry_after(r#"{"error":{"message":"Something went wrong"}}"#), 30);
        assert_eq!(parse_retry_after("not json"), 30);
    }

    #[test]
    fn provider_info_names_model() {
        let model =
            OpenAIChatModel::new(OpenAIChatConfig::new("k").with_model("gpt-4o-mini")).unwrap();
        let info = model.provider_info();
        assert_eq!(info.name, "openai");
        assert_eq!(info.model, "gpt-4o-mini");
    }
}
