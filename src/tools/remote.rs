use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{Tool, ToolError, ToolResult};
use crate::arcade::{ArcadeClient, FormattedTool};

/// A tool whose handler runs on the Arcade service on behalf of one user.
pub struct RemoteTool {
    name: String,
    description: String,
    parameters: Value,
    client: Arc<ArcadeClient>,
    user_id: String,
}

impl RemoteTool {
    pub fn new(definition: FormattedTool, client: Arc<ArcadeClient>, user_id: String) -> Self {
        let function = definition.function;
        Self {
            name: function.name,
            description: function.description,
            parameters: function.parameters,
            client,
            user_id,
        }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    async fn execute(&self, args: &Value) -> ToolResult<String> {
        let response = self
            .client
            .execute_tool(&self.name, args, &self.user_id)
            .await
            .map_err(|source| ToolError::Remote {
                tool: self.name.clone(),
                source,
            })?;

        if response.success {
            return Ok(response.value_text());
        }

        let message = response
            .error_message()
            .unwrap_or_else(|| "the tool reported a failure without details".to_string());
        Err(ToolError::ExecutionFailed {
            tool: self.name.clone(),
            message,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> Value {
        self.parameters.clone()
    }
}
