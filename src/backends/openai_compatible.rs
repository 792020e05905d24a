use super::strategy::RetryStrategy;
use super::{LlmBackend, LlmError, LlmResponse};
use crate::agent::{Conversation, ConversationMessage, ToolCall};
use crate::config::{BackendConfig, ConfigError, ConfigResult};
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    pub name: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f32>,
}

impl OpenAICompatibleConfig {
    /// Resolves the settings for backend `name`. The API key and the model
    /// have no defaults and must be configured before the session starts.
    pub fn from_backend_config(name: &str, config: &BackendConfig) -> ConfigResult<Self> {
        let required = |value: &Option<String>, setting: &str, hint: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MissingField {
                    field: format!("backends.{}.{}", name, setting),
                    hint: hint.to_string(),
                })
        };

        Ok(Self {
            name: name.to_string(),
            api_key: required(&config.api_key, "api_key", "OPENAI_API_KEY")?,
            model: required(&config.model, "model", "OPENAI_MODEL or --model")?,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            temperature: config.temperature,
        })
    }
}

pub struct OpenAICompatibleBackend {
    client: reqwest::Client,
    config: OpenAICompatibleConfig,
    retry: RetryStrategy,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationMessage],
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl OpenAICompatibleBackend {
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self, LlmError> {
        let mut client_builder = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30));

        if let Ok(https_proxy) = std::env::var("HTTPS_PROXY")
            && let Ok(proxy) = reqwest::Proxy::https(&https_proxy)
        {
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder.build().map_err(|e| LlmError::Other {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        let retry = RetryStrategy::new(3, format!("{} chat completion", config.name));
        Ok(Self {
            client,
            config,
            retry,
        })
    }

    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    fn http_error_to_llm_error(
        status: reqwest::StatusCode,
        retry_after: Option<u64>,
        error_text: String,
    ) -> LlmError {
        let status_code = status.as_u16();

        match status_code {
            429 => LlmError::RateLimit {
                retry_after,
                message: error_text,
            },
            500..=599 => LlmError::ServerError {
                status: status_code,
                message: error_text,
            },
            401 | 403 => LlmError::AuthenticationError {
                message: error_text,
            },
            _ => LlmError::Other {
                message: format!("API error {}: {}", status_code, error_text),
            },
        }
    }

    async fn send_message_with_tools_attempt(
        &self,
        conversation: &Conversation,
        tools: &ToolRegistry,
    ) -> Result<LlmResponse, LlmError> {
        let request = self.create_request_with_tools(conversation, tools);
        let url = format!("{}/chat/completions", self.config.base_url);

        tracing::debug!(
            model = %self.config.model,
            messages = conversation.len(),
            tools = tools.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::http_error_to_llm_error(status, retry_after, error_text));
        }

        let response_data: ChatCompletionResponse =
            response.json().await.map_err(|e| LlmError::Other {
                message: format!("Failed to parse response: {}", e),
            })?;

        let message = response_data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message);

        match message {
            Some(ResponseMessage {
                content,
                tool_calls: Some(tool_calls),
            }) if !tool_calls.is_empty() => Ok(LlmResponse::with_tool_calls(content, tool_calls)),
            Some(ResponseMessage {
                content: Some(content),
                ..
            }) => Ok(LlmResponse::content_only(content)),
            _ => Err(LlmError::Other {
                message: format!("No valid response from {}", self.config.name),
            }),
        }
    }

    fn create_request_with_tools<'a>(
        &'a self,
        conversation: &'a Conversation,
        tools: &ToolRegistry,
    ) -> ChatCompletionRequest<'a> {
        let tool_schemas = tools.get_tool_schemas();
        let has_tools = !tool_schemas.is_empty();

        ChatCompletionRequest {
            model: &self.config.model,
            messages: conversation.get_messages_for_api(),
            max_completion_tokens: 4096,
            temperature: self.config.temperature,
            tools: has_tools.then_some(tool_schemas),
            tool_choice: has_tools.then_some("auto"),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAICompatibleBackend {
    async fn send_message_with_tools(
        &self,
        conversation: &Conversation,
        tools: &ToolRegistry,
    ) -> Result<LlmResponse, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::AuthenticationError {
                message: format!(
                    "{} API key not configured. Set OPENAI_API_KEY or backends.{}.api_key",
                    self.config.name, self.config.name
                ),
            });
        }

        self.retry
            .execute(|| self.send_message_with_tools_attempt(conversation, tools))
            .await
    }

    fn backend_name(&self) -> &str {
        &self.config.name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
#[path = "openai_compatible_tests.rs"]
mod tests;
