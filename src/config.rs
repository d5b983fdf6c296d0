//! Configuration system for the market advisor service
//!
//! Every section and field carries a serde default, so an empty TOML file (or
//! no file at all) yields a runnable configuration. Secrets are never stored
//! in the file; the file names the environment variables that hold them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful financial advisor. Your goal is to provide accurate and up-to-date information on the stock market.";

/// Main service configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// LLM section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Provider name, only "openai" is supported
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable containing API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
    /// Chat completions API root
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Persona text placed in the system message
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Optional max tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Append the current UTC date/time to the system prompt
    #[serde(default)]
    pub include_current_date: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_llm_api_key_env(),
            base_url: default_llm_base_url(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_llm_timeout_secs(),
            include_current_date: false,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_llm_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.0)
}

fn default_llm_timeout_secs() -> u64 {
    60
}

/// Agent loop budget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSection {
    /// Maximum model turns per query before the loop is force-stopped
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_iterations() -> usize {
    15
}

/// Per-tool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolsSection {
    #[serde(default)]
    pub stock_price: StockPriceToolConfig,
    #[serde(default)]
    pub google_search: GoogleSearchToolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockPriceToolConfig {
    #[serde(default = "default_marketwatch_url")]
    pub base_url: String,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StockPriceToolConfig {
    fn default() -> Self {
        Self {
            base_url: default_marketwatch_url(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_marketwatch_url() -> String {
    "https://www.marketwatch.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleSearchToolConfig {
    #[serde(default = "default_google_url")]
    pub base_url: String,
    /// Environment variable containing the Custom Search API key
    #[serde(default = "default_google_api_key_env")]
    pub api_key_env: String,
    /// Environment variable containing the search engine id
    #[serde(default = "default_google_cse_id_env")]
    pub cse_id_env: String,
    #[serde(default = "default_num_results")]
    pub num_results: u32,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GoogleSearchToolConfig {
    fn default() -> Self {
        Self {
            base_url: default_google_url(),
            api_key_env: default_google_api_key_env(),
            cse_id_env: default_google_cse_id_env(),
            num_results: default_num_results(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_google_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_google_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_google_cse_id_env() -> String {
    "GOOGLE_CSE_ID".to_string()
}

fn default_num_results() -> u32 {
    10
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AdvisorConfig {
    /// Load configuration from TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AdvisorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.provider != "openai" {
            return Err(ConfigError::InvalidConfig(format!(
                "Unsupported LLM provider: {}",
                self.llm.provider
            )));
        }

        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidConfig(format!(
                    "llm.temperature must be between 0.0 and 2.0, got {temperature}"
                )));
            }
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::InvalidConfig(
                "agent.max_iterations must be at least 1".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be non-zero".to_string(),
            ));
        }

        let num_results = self.tools.google_search.num_results;
        if !(1..=10).contains(&num_results) {
            return Err(ConfigError::InvalidConfig(format!(
                "tools.google_search.num_results must be between 1 and 10, got {num_results}"
            )));
        }

        Ok(())
    }

    /// Apply `ADVISOR_PORT` if it is set to a valid port
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("ADVISOR_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
    }

    /// Helper method to get environment variable with error propagation
    pub(crate) fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Get LLM API key from environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.llm.api_key_env)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
