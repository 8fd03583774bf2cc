use colloquy_llm::{AssistantRequest, AssistantTool, ClientConfig, DEFAULT_BASE_URL};
use colloquy_session::{PollPolicy, SessionOptions, DEFAULT_CACHE_WINDOW};
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub assistant: AssistantSettings,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiSettings,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub assistant_id: Option<String>,
}

/// Used when no `ASSISTANT_ID` is given and a new assistant has to be created
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantSettings {
    pub model: String,
    pub name: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Assistant,
    Chat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub mode: ModeKind,
    #[serde(default = "default_cache_window")]
    pub cache_window: usize,
    pub run_timeout_secs: u64,
    pub file_timeout_secs: u64,
    pub quit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_cache_window() -> usize {
    DEFAULT_CACHE_WINDOW
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables with the COLLOQUY_ prefix, `__` between
    ///    section and key (e.g. `COLLOQUY_SESSION__MODE=chat`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("COLLOQUY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        cfg.assistant_id = std::env::var("ASSISTANT_ID")
            .ok()
            .filter(|id| !id.trim().is_empty());

        Ok(cfg)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.openai_api_key.clone())
            .with_base_url(self.api.base_url.clone())
            .with_request_timeout(Duration::from_secs(self.api.request_timeout_secs))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            cache_window: self.session.cache_window,
            run_policy: PollPolicy::for_runs()
                .with_timeout(Duration::from_secs(self.session.run_timeout_secs)),
            file_policy: PollPolicy::for_files()
                .with_timeout(Duration::from_secs(self.session.file_timeout_secs)),
        }
    }

    pub fn assistant_request(&self) -> Result<AssistantRequest, ConfigError> {
        let settings = &self.assistant;
        let tools = settings
            .tools
            .iter()
            .map(|name| name.parse::<AssistantTool>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(ConfigError::Message)?;

        let mut request = AssistantRequest::new(settings.model.clone())
            .name(settings.name.clone())
            .tools(tools);
        if let Some(instructions) = &settings.instructions {
            request = request.instructions(instructions.clone());
        }
        if let Some(temperature) = settings.temperature {
            request = request.temperature(temperature);
        }
        Ok(request)
    }
}
