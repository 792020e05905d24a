use std::sync::atomic::{AtomicUsize, Ordering};

use super::AgentEvent;
use crate::console::console;

/// Receives agent lifecycle events as they happen.
pub trait AgentHooks: Send + Sync {
    fn on_event(&self, event: &AgentEvent);
}

pub struct NoopHooks;

impl AgentHooks for NoopHooks {
    fn on_event(&self, _event: &AgentEvent) {}
}

/// Prints numbered lifecycle lines such as
/// `### (confluence) 1: Agent confluence_agent started`.
pub struct ConsoleHooks {
    display_name: String,
    counter: AtomicUsize,
}

impl ConsoleHooks {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            counter: AtomicUsize::new(0),
        }
    }

    /// Numbers the event and renders it. `None` for events without a lifecycle line.
    pub fn format_event(&self, event: &AgentEvent) -> Option<String> {
        let body = match event {
            AgentEvent::AgentStarted { agent_name } => format!("Agent {} started", agent_name),
            AgentEvent::AgentEnded { agent_name, .. } => format!("Agent {} ended", agent_name),
            AgentEvent::ToolStarted {
                agent_name,
                tool_name,
                user_id,
            } => format!(
                "Agent {} started tool {} with context: user_id={}",
                agent_name,
                tool_name,
                user_id.as_deref().unwrap_or("none")
            ),
            AgentEvent::ToolEnded {
                agent_name,
                tool_name,
                ..
            } => format!("Agent {} ended tool {}", agent_name, tool_name),
            AgentEvent::MaxStepsReached(_) => return None,
        };

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Some(format!("### ({}) {}: {}", self.display_name, n, body))
    }
}

impl AgentHooks for ConsoleHooks {
    fn on_event(&self, event: &AgentEvent) {
        if let AgentEvent::MaxStepsReached(max_steps) = event {
            console().max_steps_reached(*max_steps);
            return;
        }
        if let Some(line) = self.format_event(event) {
            console().lifecycle(&line);
        }
    }
}
