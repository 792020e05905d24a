mod error;

pub use error::{ConfigError, ConfigResult};

use crate::console::VerbosityLevel;
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, path::PathBuf};

pub const DEFAULT_TOOL_LIMIT: u32 = 100;
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_STEPS: usize = 30;
pub const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ArcadeConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Identifies who authorizes each remote service.
    pub user_id: Option<String>,
}

/// Which discovered tools are wrapped by the confirmation gate.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Only the tools named in `confirmation.tools`.
    #[default]
    Listed,
    All,
    Off,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfirmationConfig {
    #[serde(default)]
    pub mode: ConfirmationMode,
    #[serde(default = "default_confirmation_tools")]
    pub tools: Vec<String>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            mode: ConfirmationMode::default(),
            tools: default_confirmation_tools(),
        }
    }
}

fn default_confirmation_tools() -> Vec<String> {
    vec![
        "Confluence_CreatePage".to_string(),
        "Confluence_UpdatePageContent".to_string(),
        "Confluence_RenamePage".to_string(),
    ]
}

fn default_backend() -> String {
    "openai".to_string()
}

fn default_toolkits() -> Vec<String> {
    vec!["Confluence".to_string()]
}

fn default_tool_limit() -> u32 {
    DEFAULT_TOOL_LIMIT
}

fn default_auth_timeout_secs() -> u64 {
    DEFAULT_AUTH_TIMEOUT_SECS
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

fn default_agent_name() -> String {
    "confluence_agent".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_backend")]
    pub default_backend: String,
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,
    #[serde(default)]
    pub arcade: ArcadeConfig,
    #[serde(default = "default_toolkits")]
    pub toolkits: Vec<String>,
    /// Individual tools fetched in addition to whole toolkits.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default = "default_tool_limit")]
    pub tool_limit: u32,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    #[serde(default)]
    pub verbosity: Option<String>,
    /// Path to a file replacing the built-in instructions.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            backends: HashMap::new(),
            arcade: ArcadeConfig::default(),
            toolkits: default_toolkits(),
            tools: Vec::new(),
            tool_limit: DEFAULT_TOOL_LIMIT,
            confirmation: ConfirmationConfig::default(),
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT_SECS,
            max_steps: DEFAULT_MAX_STEPS,
            agent_name: default_agent_name(),
            verbosity: None,
            system_prompt: None,
        }
    }
}

impl AppConfig {
    /// Loads the user config file (defaults when absent), then overlays the
    /// process environment and finally a `.env` file in the working directory.
    pub fn load() -> ConfigResult<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_env_file(Path::new(ENV_FILE))?;
        Ok(config)
    }

    /// Overlays the `KEY=value` pairs of a dotenv file. Its values win over the
    /// process environment. A missing file is not an error.
    pub fn apply_env_file(&mut self, path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            return Ok(());
        }
        let to_error = |source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(to_error)? {
            let (key, value) = item.map_err(to_error)?;
            vars.insert(key, value);
        }
        tracing::debug!(path = %path.display(), vars = vars.len(), "loaded env file");

        self.apply_env(|key| vars.get(key).cloned());
        Ok(())
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Environment values win over the file. `lookup` is injected so tests do
    /// not depend on the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai = self.backends.entry("openai".to_string()).or_default();
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            openai.api_key = Some(key);
        }
        if let Some(model) = non_empty("OPENAI_MODEL") {
            openai.model = Some(model);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            openai.base_url = Some(url);
        }

        if let Some(key) = non_empty("ARCADE_API_KEY") {
            self.arcade.api_key = Some(key);
        }
        if let Some(url) = non_empty("ARCADE_BASE_URL") {
            self.arcade.base_url = Some(url);
        }
        if let Some(user_id) = non_empty("ARCADE_USER_ID") {
            self.arcade.user_id = Some(user_id);
        }
    }

    pub fn get_backend_config(&self, backend_name: &str) -> Option<&BackendConfig> {
        self.backends.get(backend_name)
    }

    pub fn backend_config_mut(&mut self, backend_name: &str) -> &mut BackendConfig {
        self.backends.entry(backend_name.to_string()).or_default()
    }

    pub fn user_id(&self) -> ConfigResult<&str> {
        self.arcade
            .user_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "arcade.user_id".to_string(),
                hint: "ARCADE_USER_ID or --user-id".to_string(),
            })
    }

    pub fn arcade_api_key(&self) -> ConfigResult<&str> {
        self.arcade
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "arcade.api_key".to_string(),
                hint: "ARCADE_API_KEY".to_string(),
            })
    }

    /// Get the configured verbosity level, falling back to Normal if not set
    pub fn get_verbosity(&self) -> VerbosityLevel {
        self.verbosity
            .as_deref()
            .and_then(VerbosityLevel::parse)
            .unwrap_or(VerbosityLevel::Normal)
    }

    /// The agent instructions: the configured file if any, else the built-in
    /// Confluence prompt.
    pub fn load_system_prompt(&self) -> ConfigResult<String> {
        match &self.system_prompt {
            Some(path) => {
                let path = PathBuf::from(path);
                fs::read_to_string(&path).map_err(|source| ConfigError::ReadFailed { path, source })
            }
            None => Ok(prompts::CONFLUENCE_INSTRUCTIONS.to_string()),
        }
    }

    /// Renders the effective configuration with secrets masked.
    pub fn masked_summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("default_backend = \"{}\"", self.default_backend),
            format!("agent_name = \"{}\"", self.agent_name),
            format!("toolkits = {:?}", self.toolkits),
            format!("tools = {:?}", self.tools),
            format!("tool_limit = {}", self.tool_limit),
            format!("auth_timeout_secs = {}", self.auth_timeout_secs),
            format!("max_steps = {}", self.max_steps),
        ];
        if let Some(ref verbosity) = self.verbosity {
            lines.push(format!("verbosity = \"{}\"", verbosity));
        }
        if let Some(ref system_prompt) = self.system_prompt {
            lines.push(format!("system_prompt = \"{}\"", system_prompt));
        }

        lines.push(String::new());
        lines.push("[confirmation]".to_string());
        lines.push(format!("mode = \"{:?}\"", self.confirmation.mode).to_lowercase());
        lines.push(format!("tools = {:?}", self.confirmation.tools));

        lines.push(String::new());
        lines.push("[arcade]".to_string());
        if let Some(ref api_key) = self.arcade.api_key {
            lines.push(format!("api_key = \"{}\"", mask_secret(api_key)));
        }
        if let Some(ref base_url) = self.arcade.base_url {
            lines.push(format!("base_url = \"{}\"", base_url));
        }
        if let Some(ref user_id) = self.arcade.user_id {
            lines.push(format!("user_id = \"{}\"", user_id));
        }

        let mut backend_names: Vec<_> = self.backends.keys().collect();
        backend_names.sort();
        for backend_name in backend_names {
            let backend_config = &self.backends[backend_name];
            lines.push(String::new());
            lines.push(format!("[backends.{}]", backend_name));
            if let Some(ref api_key) = backend_config.api_key {
                lines.push(format!("api_key = \"{}\"", mask_secret(api_key)));
            }
            if let Some(ref model) = backend_config.model {
                lines.push(format!("model = \"{}\"", model));
            }
            if let Some(ref base_url) = backend_config.base_url {
                lines.push(format!("base_url = \"{}\"", base_url));
            }
            if let Some(temperature) = backend_config.temperature {
                lines.push(format!("temperature = {}", temperature));
            }
        }
        lines
    }

    pub fn config_path() -> ConfigResult<PathBuf> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDirectory)?;
        path.push("confluence-agent");
        path.push("config.toml");
        Ok(path)
    }
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
