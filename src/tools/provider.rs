use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::arcade::{ArcadeClient, ArcadeError, FormattedTool};
use crate::tools::{RemoteTool, Tool};

/// Source of the tools handed to the agent.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn provide_tools(&self) -> Result<Vec<Arc<dyn Tool>>, ArcadeError>;

    /// Provider name for debugging/logging
    fn provider_name(&self) -> &'static str;
}

/// Discovers whole toolkits, plus individually named tools, from Arcade.
pub struct ToolkitProvider {
    client: Arc<ArcadeClient>,
    user_id: String,
    toolkits: Vec<String>,
    tools: Vec<String>,
    limit: u32,
}

impl ToolkitProvider {
    pub fn new(client: Arc<ArcadeClient>, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            toolkits: Vec::new(),
            tools: Vec::new(),
            limit: crate::config::DEFAULT_TOOL_LIMIT,
        }
    }

    pub fn with_toolkits(mut self, toolkits: Vec<String>) -> Self {
        self.toolkits = toolkits;
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Tool definitions in discovery order, first occurrence of a name wins.
    pub async fn discover(&self) -> Result<Vec<FormattedTool>, ArcadeError> {
        let mut seen = HashSet::new();
        let mut definitions = Vec::new();

        for toolkit in &self.toolkits {
            let listed = self.client.list_tools(toolkit, self.limit).await?;
            tracing::info!(toolkit = %toolkit, count = listed.len(), "discovered toolkit");
            for definition in listed {
                if seen.insert(definition.function.name.clone()) {
                    definitions.push(definition);
                }
            }
        }

        for tool_name in &self.tools {
            let definition = self.client.get_tool(tool_name).await?;
            if seen.insert(definition.function.name.clone()) {
                definitions.push(definition);
            }
        }

        Ok(definitions)
    }
}

#[async_trait]
impl ToolProvider for ToolkitProvider {
    async fn provide_tools(&self) -> Result<Vec<Arc<dyn Tool>>, ArcadeError> {
        let definitions = self.discover().await?;
        Ok(definitions
            .into_iter()
            .map(|definition| {
                Arc::new(RemoteTool::new(
                    definition,
                    Arc::clone(&self.client),
                    self.user_id.clone(),
                )) as Arc<dyn Tool>
            })
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "arcade"
    }
}
