/// Lifecycle notifications emitted by [`crate::agent::Agent`] while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    AgentStarted {
        agent_name: String,
    },
    AgentEnded {
        agent_name: String,
        output: String,
    },
    ToolStarted {
        agent_name: String,
        tool_name: String,
        user_id: Option<String>,
    },
    ToolEnded {
        agent_name: String,
        tool_name: String,
        success: bool,
    },
    MaxStepsReached(usize),
}
