use crate::config::{AppConfig, ConfirmationMode};
use crate::console::VerbosityLevel;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with your Confluence workspace through Arcade tools")]
pub struct Cli {
    /// Increase verbosity (-v verbose, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Backend to use for chat (openai, mock)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Model name passed to the backend
    #[arg(short, long)]
    pub model: Option<String>,

    /// User id the remote tools act on behalf of
    #[arg(short, long)]
    pub user_id: Option<String>,

    /// Toolkit to load; repeat for several. Replaces the configured list
    #[arg(short, long = "toolkit")]
    pub toolkits: Vec<String>,

    /// Run every tool without asking
    #[arg(long, conflicts_with = "confirm_all")]
    pub skip_confirmation: bool,

    /// Ask before every tool call, not only the ones that modify content
    #[arg(long)]
    pub confirm_all: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tools the agent would load
    Tools,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets masked
    Show,
}

impl Cli {
    pub fn get_verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else {
            match self.verbose {
                0 => VerbosityLevel::Normal,
                1 => VerbosityLevel::Verbose,
                _ => VerbosityLevel::Debug,
            }
        }
    }

    pub fn get_effective_verbosity(&self, config_verbosity: VerbosityLevel) -> VerbosityLevel {
        if self.quiet || self.verbose > 0 {
            self.get_verbosity()
        } else {
            config_verbosity
        }
    }

    /// Flags win over both the config file and the environment.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(backend) = &self.backend {
            config.default_backend = backend.clone();
        }
        if let Some(model) = &self.model {
            let backend = config.default_backend.clone();
            config.backend_config_mut(&backend).model = Some(model.clone());
        }
        if let Some(user_id) = &self.user_id {
            config.arcade.user_id = Some(user_id.clone());
        }
        if !self.toolkits.is_empty() {
            config.toolkits = self.toolkits.clone();
        }
        if self.skip_confirmation {
            config.confirmation.mode = ConfirmationMode::Off;
        } else if self.confirm_all {
            config.confirmation.mode = ConfirmationMode::All;
        }
    }
}
