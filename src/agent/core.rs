use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::agent_events::AgentEvent;
use crate::agent::hooks::{AgentHooks, NoopHooks};
use crate::agent::Conversation;
use crate::backends::{LlmBackend, LlmResponse};
use crate::confirmation::UserDeniedToolCall;
use crate::config::DEFAULT_MAX_STEPS;
use crate::console::console;
use crate::tool_executor::{BatchAbort, ToolExecutor, ToolProgress};
use crate::tools::ToolRegistry;

/// Result of one agent run over a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The model produced a final answer. `conversation` is the caller's
    /// history extended with every message of this run.
    Completed {
        conversation: Conversation,
        final_output: String,
    },
    /// A gated tool call was refused. Everything the run produced is discarded.
    Denied(UserDeniedToolCall),
}

/// Anything that can answer a conversation; the chat loop only needs this.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(&self, conversation: &Conversation) -> Result<RunOutcome>;

    fn name(&self) -> &str;
}

pub struct Agent {
    name: String,
    backend: Arc<dyn LlmBackend>,
    tool_registry: Arc<ToolRegistry>,
    tool_executor: Arc<ToolExecutor>,
    max_steps: usize,
    hooks: Arc<dyn AgentHooks>,
    context_user_id: Option<String>,
}

enum TurnStatus {
    Continue,
    Complete(String),
    Denied(UserDeniedToolCall),
    Failed(BatchAbort),
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn LlmBackend>,
        tool_registry: Arc<ToolRegistry>,
        tool_executor: Arc<ToolExecutor>,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            tool_registry,
            tool_executor,
            max_steps: DEFAULT_MAX_STEPS,
            hooks: Arc::new(NoopHooks),
            context_user_id: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn AgentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// User id reported with every tool start event.
    pub fn with_context_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.context_user_id = Some(user_id.into());
        self
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    fn send_event(&self, event: AgentEvent) {
        self.hooks.on_event(&event);
    }

    async fn process_response(
        &self,
        conversation: &mut Conversation,
        response: LlmResponse,
    ) -> TurnStatus {
        let LlmResponse {
            content,
            tool_calls,
        } = response;

        let tool_calls = match tool_calls {
            Some(calls) if !calls.is_empty() => calls,
            _ => {
                let text = content.unwrap_or_default();
                conversation.add_assistant_message(Some(text.clone()), None);
                return TurnStatus::Complete(text);
            }
        };

        conversation.add_assistant_message(content, Some(tool_calls.clone()));

        let hooks = &self.hooks;
        let agent_name = &self.name;
        let user_id = &self.context_user_id;
        let results = self
            .tool_executor
            .execute_tool_calls(&tool_calls, |progress| {
                let event = match progress {
                    ToolProgress::Started(call) => AgentEvent::ToolStarted {
                        agent_name: agent_name.clone(),
                        tool_name: call.function.name.clone(),
                        user_id: user_id.clone(),
                    },
                    ToolProgress::Finished(result) => AgentEvent::ToolEnded {
                        agent_name: agent_name.clone(),
                        tool_name: result.tool_name.clone(),
                        success: result.result.is_ok(),
                    },
                };
                hooks.on_event(&event);
            })
            .await;

        match results {
            Ok(results) => {
                for result in &results {
                    conversation.add_tool_result(result);
                }
                TurnStatus::Continue
            }
            Err(BatchAbort::Denied(denied)) => TurnStatus::Denied(denied),
            Err(failure) => TurnStatus::Failed(failure),
        }
    }
}

#[async_trait]
impl AgentRuntime for Agent {
    async fn run(&self, conversation: &Conversation) -> Result<RunOutcome> {
        let mut working = conversation.clone();
        self.send_event(AgentEvent::AgentStarted {
            agent_name: self.name.clone(),
        });

        for step in 0..self.max_steps {
            tracing::debug!(agent = %self.name, step, "agent step");
            console().thinking();

            let response = self
                .backend
                .send_message_with_tools(&working, &self.tool_registry)
                .await
                .with_context(|| format!("{} backend request failed", self.backend.backend_name()))?;

            match self.process_response(&mut working, response).await {
                TurnStatus::Continue => continue,
                TurnStatus::Complete(final_output) => {
                    self.send_event(AgentEvent::AgentEnded {
                        agent_name: self.name.clone(),
                        output: final_output.clone(),
                    });
                    return Ok(RunOutcome::Completed {
                        conversation: working,
                        final_output,
                    });
                }
                TurnStatus::Denied(denied) => return Ok(RunOutcome::Denied(denied)),
                TurnStatus::Failed(failure) => return Err(failure.into()),
            }
        }

        self.send_event(AgentEvent::MaxStepsReached(self.max_steps));
        self.send_event(AgentEvent::AgentEnded {
            agent_name: self.name.clone(),
            output: String::new(),
        });
        Ok(RunOutcome::Completed {
            conversation: working,
            final_output: String::new(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;
