mod agent_events;
mod conversation;
mod core;
mod hooks;

pub use agent_events::AgentEvent;
pub use conversation::{
    Conversation, ConversationMessage, ToolCall, ToolCallResponse, ToolFunction,
};
pub use self::core::{Agent, AgentRuntime, RunOutcome};
pub use hooks::{AgentHooks, ConsoleHooks, NoopHooks};
