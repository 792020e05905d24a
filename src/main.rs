use anyhow::{Context, Result};
use clap::Parser;
use confluence_agent::{
    agent::{Agent, ConsoleHooks, Conversation},
    arcade::ArcadeClient,
    authorization::authorize_all,
    backends::create_backend,
    chat_loop::ChatLoop,
    cli::{Cli, Commands, ConfigAction},
    config::AppConfig,
    confirmation::{ConfirmationPolicy, ConfirmationPrompt, StdinConfirmation},
    console::{console, init_console},
    input::PromptReader,
    logging::init_tracing,
    tool_executor::ToolExecutor,
    tools::{ToolProvider, ToolRegistry, ToolkitProvider},
};
use std::sync::Arc;
use std::time::Duration;

const HOOKS_LABEL: &str = "confluence";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let effective_verbosity = cli.get_effective_verbosity(config.get_verbosity());
    init_console(effective_verbosity);
    init_tracing(effective_verbosity);

    match cli.command {
        Some(Commands::Config {
            action: ConfigAction::Show,
        }) => handle_config_show(&config),
        Some(Commands::Tools) => handle_tools(&config).await,
        None => handle_chat(&config).await,
    }
}

fn handle_config_show(config: &AppConfig) -> Result<()> {
    let path = AppConfig::config_path()?;
    console().info(&format!("Configuration file: {}", path.display()));
    console().newline();
    for line in config.masked_summary() {
        console().plain(&line);
    }
    Ok(())
}

fn arcade_client(config: &AppConfig) -> Result<Arc<ArcadeClient>> {
    let client = ArcadeClient::new(config.arcade_api_key()?, config.arcade.base_url.clone())?;
    Ok(Arc::new(client))
}

fn tool_provider(config: &AppConfig, client: Arc<ArcadeClient>, user_id: &str) -> ToolkitProvider {
    ToolkitProvider::new(client, user_id)
        .with_toolkits(config.toolkits.clone())
        .with_tools(config.tools.clone())
        .with_limit(config.tool_limit)
}

/// Lists what discovery returns; authorization is not touched.
async fn handle_tools(config: &AppConfig) -> Result<()> {
    let client = arcade_client(config)?;
    let user_id = config.arcade.user_id.clone().unwrap_or_default();
    let definitions = tool_provider(config, client, &user_id)
        .discover()
        .await
        .context("Failed to discover tools")?;

    console().tools_header();
    for definition in &definitions {
        console().plain(&format!(
            "  • {}: {}",
            definition.function.name, definition.function.description
        ));
    }
    console().newline();
    console().info(&format!("{} tools", definitions.len()));
    Ok(())
}

async fn handle_chat(config: &AppConfig) -> Result<()> {
    let user_id = config.user_id()?.to_string();
    let backend = create_backend(config)?;
    let client = arcade_client(config)?;

    let provider = tool_provider(config, Arc::clone(&client), &user_id);
    let tools = provider
        .provide_tools()
        .await
        .with_context(|| format!("Failed to load tools from {}", provider.provider_name()))?;

    let reader = PromptReader::stdin();
    let prompt: Arc<dyn ConfirmationPrompt> = Arc::new(StdinConfirmation::new(reader.clone()));
    let tools = ConfirmationPolicy::from_config(&config.confirmation).apply(tools, &prompt);
    let tool_registry = Arc::new(ToolRegistry::from_tools(tools)?);

    let tool_names: Vec<String> = tool_registry
        .list_tools()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    authorize_all(
        &client,
        &tool_names,
        &user_id,
        Duration::from_secs(config.auth_timeout_secs),
    )
    .await?;

    let tool_executor = Arc::new(ToolExecutor::new(Arc::clone(&tool_registry)));
    let agent = Agent::new(
        config.agent_name.clone(),
        Arc::clone(&backend),
        Arc::clone(&tool_registry),
        tool_executor,
    )
    .with_max_steps(config.max_steps)
    .with_hooks(Arc::new(ConsoleHooks::new(HOOKS_LABEL)))
    .with_context_user_id(user_id);

    let conversation = Conversation::with_system_prompt(config.load_system_prompt()?);

    console().welcome(backend.model_name(), tool_registry.len());
    console().newline();

    let mut chat = ChatLoop::new(Arc::new(agent), reader, std::io::stdout());
    chat.run(conversation).await?;
    Ok(())
}
