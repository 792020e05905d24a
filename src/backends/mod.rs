use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::{Conversation, ToolCall};
use crate::config::{AppConfig, BackendConfig, ConfigError};
use crate::tools::ToolRegistry;

pub mod llm_error;
pub mod mock;
pub mod openai_compatible;
pub mod strategy;

pub use llm_error::LlmError;
pub use mock::MockBackend;
pub use openai_compatible::{OpenAICompatibleBackend, OpenAICompatibleConfig};
pub use strategy::{RetryStrategy, RetryableError};

#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl LlmResponse {
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content,
            tool_calls: Some(tool_calls),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn send_message_with_tools(
        &self,
        conversation: &Conversation,
        tools: &ToolRegistry,
    ) -> Result<LlmResponse, LlmError>;

    fn backend_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Builds the backend named by `config.default_backend`. Missing credentials
/// or model fail here, before any tool is authorized.
pub fn create_backend(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmBackend>> {
    let backend_name = config.default_backend.as_str();
    match backend_name {
        "mock" => Ok(Arc::new(MockBackend::new())),
        "openai" => {
            let settings = config
                .get_backend_config(backend_name)
                .cloned()
                .unwrap_or_else(BackendConfig::default);
            let openai = OpenAICompatibleConfig::from_backend_config(backend_name, &settings)?;
            Ok(Arc::new(OpenAICompatibleBackend::new(openai)?))
        }
        other => Err(ConfigError::InvalidValue {
            field: "default_backend".to_string(),
            value: format!("{} (available: openai, mock)", other),
        }
        .into()),
    }
}
