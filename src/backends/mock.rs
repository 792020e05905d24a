use async_trait::async_trait;
use std::sync::Mutex;

use super::{LlmBackend, LlmError, LlmResponse};
use crate::agent::{Conversation, ToolCall, ToolFunction};
use crate::tools::ToolRegistry;

/// Backend that replays a fixed script of responses.
///
/// Once the script runs out it echoes the last user message, so the `mock`
/// backend setting stays usable interactively.
pub struct MockBackend {
    responses: Vec<LlmResponse>,
    next: Mutex<usize>,
    requests: Mutex<Vec<Conversation>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses,
            next: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Convenience for a single tool call response.
    pub fn tool_call(id: &str, name: &str, arguments: &str) -> LlmResponse {
        LlmResponse::with_tool_calls(
            None,
            vec![ToolCall {
                id: id.to_string(),
                r#type: "function".to_string(),
                function: ToolFunction {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }],
        )
    }

    /// Conversations received so far, in call order.
    pub fn requests(&self) -> Vec<Conversation> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn send_message_with_tools(
        &self,
        conversation: &Conversation,
        _tools: &ToolRegistry,
    ) -> Result<LlmResponse, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(conversation.clone());
        }

        let mut next = self.next.lock().map_err(|_| LlmError::Other {
            message: "mock backend state poisoned".to_string(),
        })?;

        if let Some(response) = self.responses.get(*next) {
            *next += 1;
            return Ok(response.clone());
        }

        let last_user = conversation
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .and_then(|m| m.content.clone())
            .unwrap_or_default();
        Ok(LlmResponse::content_only(format!(
            "Mock response to: {}",
            last_user
        )))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_echoes() {
        let backend = MockBackend::scripted(vec![LlmResponse::content_only("first")]);
        let mut conversation = Conversation::new();
        conversation.add_user_message("hello".to_string());
        let tools = ToolRegistry::new();

        let first = backend
            .send_message_with_tools(&conversation, &tools)
            .await
            .unwrap();
        let second = backend
            .send_message_with_tools(&conversation, &tools)
            .await
            .unwrap();

        assert_eq!(first.content.as_deref(), Some("first"));
        assert_eq!(second.content.as_deref(), Some("Mock response to: hello"));
        assert_eq!(backend.requests().len(), 2);
    }
}
