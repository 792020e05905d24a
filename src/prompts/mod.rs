/// Built-in instructions for the Confluence agent.
pub const CONFLUENCE_INSTRUCTIONS: &str = include_str!("confluence.md");
