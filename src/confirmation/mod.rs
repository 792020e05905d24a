//! Human-in-the-loop gate in front of tool execution.
//!
//! [`ConfirmedTool`] wraps any [`Tool`] with a y/n question and keeps the
//! exact `Tool` signature, so the executor and the agent never know whether a
//! handler is gated. A refusal never reaches the wrapped handler and comes back
//! as [`ToolError::UserDenied`], which the executor turns into
//! [`UserDeniedToolCall`]. A prompt that cannot read an answer fails the call
//! with [`ToolError::ConfirmationFailed`], which ends the agent run.

mod prompt;

pub use prompt::{ConfirmationDecision, ConfirmationPrompt, FixedConfirmation, StdinConfirmation};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::arcade::qualified_tool_name;
use crate::config::{ConfirmationConfig, ConfirmationMode};
use crate::tools::{Tool, ToolError, ToolResult};

/// The user refused a pending tool call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("User denied the call to {tool_name}")]
pub struct UserDeniedToolCall {
    pub tool_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome<T> {
    Approved(T),
    Denied { tool_name: String },
}

impl<T> GateOutcome<T> {
    pub fn into_result(self) -> Result<T, UserDeniedToolCall> {
        match self {
            GateOutcome::Approved(value) => Ok(value),
            GateOutcome::Denied { tool_name } => Err(UserDeniedToolCall { tool_name }),
        }
    }
}

/// Asks `prompt` about `tool_name`; runs `handler` only when approved.
pub async fn gate<P, F, Fut, T>(
    prompt: &P,
    tool_name: &str,
    args: &Value,
    handler: F,
) -> io::Result<GateOutcome<T>>
where
    P: ConfirmationPrompt + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    match prompt.confirm(tool_name, args).await? {
        ConfirmationDecision::Approved => Ok(GateOutcome::Approved(handler().await)),
        ConfirmationDecision::Denied => {
            tracing::info!(tool = tool_name, "tool call denied by user");
            Ok(GateOutcome::Denied {
                tool_name: tool_name.to_string(),
            })
        }
    }
}

/// Decorator that puts the confirmation gate in front of `inner`.
pub struct ConfirmedTool {
    inner: Arc<dyn Tool>,
    prompt: Arc<dyn ConfirmationPrompt>,
}

impl ConfirmedTool {
    pub fn new(inner: Arc<dyn Tool>, prompt: Arc<dyn ConfirmationPrompt>) -> Self {
        Self { inner, prompt }
    }
}

#[async_trait]
impl Tool for ConfirmedTool {
    async fn execute(&self, args: &Value) -> ToolResult<String> {
        let outcome = gate(self.prompt.as_ref(), self.inner.name(), args, || {
            self.inner.execute(args)
        })
        .await
        .map_err(|source| ToolError::ConfirmationFailed {
            tool: self.inner.name().to_string(),
            source,
        })?;

        match outcome {
            GateOutcome::Approved(result) => result,
            GateOutcome::Denied { tool_name } => Err(ToolError::UserDenied { tool: tool_name }),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameter_schema(&self) -> Value {
        self.inner.parameter_schema()
    }

    fn format_call_display(&self, args: &Value) -> String {
        self.inner.format_call_display(args)
    }
}

/// Decides which tools get wrapped in [`ConfirmedTool`].
#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    mode: ConfirmationMode,
    tools: HashSet<String>,
}

impl ConfirmationPolicy {
    pub fn new(mode: ConfirmationMode, tools: &[String]) -> Self {
        Self {
            mode,
            tools: tools.iter().map(|t| qualified_tool_name(t)).collect(),
        }
    }

    pub fn from_config(config: &ConfirmationConfig) -> Self {
        Self::new(config.mode, &config.tools)
    }

    pub fn requires_confirmation(&self, tool_name: &str) -> bool {
        match self.mode {
            ConfirmationMode::All => true,
            ConfirmationMode::Off => false,
            ConfirmationMode::Listed => self.tools.contains(&qualified_tool_name(tool_name)),
        }
    }

    pub fn apply(
        &self,
        tools: Vec<Arc<dyn Tool>>,
        prompt: &Arc<dyn ConfirmationPrompt>,
    ) -> Vec<Arc<dyn Tool>> {
        tools
            .into_iter()
            .map(|tool| {
                if self.requires_confirmation(tool.name()) {
                    Arc::new(ConfirmedTool::new(tool, Arc::clone(prompt))) as Arc<dyn Tool>
                } else {
                    tool
                }
            })
            .collect()
    }
}
