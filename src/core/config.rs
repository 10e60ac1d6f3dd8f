//! Configuration management for Itinera
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/itinera/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::core::error::{ItineraError, Result};

/// Main configuration for Itinera
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Language model provider
    #[serde(default)]
    pub llm: LlmConfig,
    /// Flight/hotel search provider
    #[serde(default)]
    pub search: SearchConfig,
    /// Orchestration loop tunables
    #[serde(default)]
    pub agent: AgentConfig,
    /// Email delivery
    #[serde(default)]
    pub email: EmailConfig,
    /// Web front end
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which language model backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Any OpenAI-compatible chat completions endpoint
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl std::str::FromStr for ProviderType {
    type Err = ItineraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAi),
            "ollama" => Ok(ProviderType::Ollama),
            other => Err(ItineraError::config(format!("Unknown provider: {}", other))),
        }
    }
}

impl ProviderType {
    /// Default base URL and model for this provider
    pub fn defaults(self) -> (&'static str, &'static str) {
        match self {
            ProviderType::OpenAi => ("https://api.openai.com/v1", "gpt-4o"),
            ProviderType::Ollama => ("http://localhost:11434", "qwen3:8b"),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::OpenAi => write!(f, "openai"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ProviderType,
    /// API base URL (e.g. https://api.openai.com/v1 or http://localhost:11434)
    pub base_url: String,
    /// Model used for tool calling and the final answer
    pub model: String,
    /// API key; read from OPENAI_API_KEY when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

/// SerpAPI search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub currency: String,
    /// Interface language (hl)
    pub language: String,
    /// Country (gl)
    pub country: String,
    /// Hotels returned per search
    pub max_hotel_results: usize,
    pub timeout_secs: u64,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum reasoning steps per episode
    /// Default: 10
    pub max_steps: usize,
    /// Extra attempts when the model call fails transiently
    /// Default: 3
    pub reasoning_retries: u32,
    /// First backoff delay between reasoning retries
    pub retry_initial_delay_ms: u64,
    /// Timeout for one model call
    pub reasoning_timeout_secs: u64,
    /// Timeout for one tool execution
    pub tool_timeout_secs: u64,
    /// Sampling temperature for the reasoning model
    pub temperature: f32,
    /// Whether to show debug output
    pub debug: bool,
    /// Replaces the built-in travel agent prompt when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// How outgoing mail is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    /// SMTP with STARTTLS, e.g. Gmail with an app password
    Smtp,
    /// SendGrid v3 HTTP API
    SendGrid,
}

impl std::str::FromStr for EmailTransport {
    type Err = ItineraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "smtp" => Ok(EmailTransport::Smtp),
            "sendgrid" => Ok(EmailTransport::SendGrid),
            other => Err(ItineraError::config(format!("Unknown email transport: {}", other))),
        }
    }
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub transport: EmailTransport,
    /// Default sender address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub default_subject: String,
    /// SendGrid API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// SendGrid endpoint
    pub api_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// SMTP login; the sender address when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_user: Option<String>,
    /// SMTP password; read from GMAIL_APP_PASSWORD when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_password: Option<String>,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for LlmConfig {
    fn default() -> Self {
        let provider = env::var("ITINERA_PROVIDER")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(ProviderType::OpenAi);

        let (base_url, model) = provider.defaults();

        Self {
            provider,
            base_url: env::var("ITINERA_LLM_URL").unwrap_or_else(|_| base_url.to_string()),
            model: env::var("ITINERA_MODEL").unwrap_or_else(|_| model.to_string()),
            api_key: env::var("OPENAI_API_KEY").ok(),
            timeout_secs: 120,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("SERPAPI_API_KEY").ok(),
            base_url: "https://serpapi.com/search.json".to_string(),
            currency: env::var("ITINERA_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            language: "en".to_string(),
            country: "us".to_string(),
            max_hotel_results: 5,
            timeout_secs: 30,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: env_parse("ITINERA_MAX_STEPS", 10),
            reasoning_retries: env_parse("ITINERA_REASONING_RETRIES", 3),
            retry_initial_delay_ms: 500,
            reasoning_timeout_secs: 90,
            tool_timeout_secs: env_parse("ITINERA_TOOL_TIMEOUT_SECS", 30),
            temperature: 0.1,
            debug: env_flag("ITINERA_DEBUG", false),
            system_prompt: None,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        let api_key = env::var("SENDGRID_API_KEY").ok();
        let smtp_password = env::var("GMAIL_APP_PASSWORD").ok();

        // SendGrid only when it is the one transport with credentials
        let transport = env::var("ITINERA_EMAIL_TRANSPORT")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(match (&api_key, &smtp_password) {
                (Some(_), None) => EmailTransport::SendGrid,
                _ => EmailTransport::Smtp,
            });

        Self {
            transport,
            sender: env::var("ITINERA_EMAIL_SENDER").ok(),
            default_subject: "Travel Information".to_string(),
            api_key,
            api_url: "https://api.sendgrid.com/v3/mail/send".to_string(),
            smtp_host: env::var("ITINERA_SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: env_parse("ITINERA_SMTP_PORT", 587),
            smtp_user: env::var("ITINERA_SMTP_USER").ok(),
            smtp_password,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var("ITINERA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("ITINERA_PORT", 7860),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("itinera")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let path = Self::config_file();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_path(&path) {
            Ok(mut config) => {
                config.fill_secrets_from_env();
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ItineraError::config("Config file not found"));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ItineraError::config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ItineraError::config(format!("Failed to parse config: {}", e)))
    }

    /// Secrets are usually kept out of the config file
    fn fill_secrets_from_env(&mut self) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = env::var("OPENAI_API_KEY").ok();
        }
        if self.search.api_key.is_none() {
            self.search.api_key = env::var("SERPAPI_API_KEY").ok();
        }
        if self.email.api_key.is_none() {
            self.email.api_key = env::var("SENDGRID_API_KEY").ok();
        }
        if self.email.smtp_password.is_none() {
            self.email.smtp_password = env::var("GMAIL_APP_PASSWORD").ok();
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file();
        self.save_to_path(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| ItineraError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ItineraError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| ItineraError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Check the tunables that would otherwise make the loop misbehave
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_steps == 0 {
            return Err(ItineraError::config("agent.max_steps must be at least 1"));
        }
        if self.agent.tool_timeout_secs == 0 || self.agent.reasoning_timeout_secs == 0 {
            return Err(ItineraError::config("agent timeouts must be non-zero"));
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.tool_timeout_secs)
    }

    pub fn reasoning_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.reasoning_timeout_secs)
    }

    /// Update the reasoning model
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.llm.model = model.into();
    }

    /// Switch provider, resetting URL and model to that provider's defaults
    pub fn set_provider(&mut self, provider: ProviderType) {
        if self.llm.provider != provider {
            let (base_url, model) = provider.defaults();
            self.llm.provider = provider;
            self.llm.base_url = base_url.to_string();
            self.llm.model = model.to_string();
        }
    }

    /// Address the web server listens on
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let mut config = Config::default();
        config.llm.api_key = None;
        config.search.api_key = None;
        config.email.api_key = None;
        config.email.smtp_password = None;
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.max_hotel_results, 5);
        assert_eq!(config.email.default_subject, "Travel Information");
        assert!(config.agent.max_steps > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<ProviderType>().unwrap(), ProviderType::OpenAi);
        assert_eq!("ollama".parse::<ProviderType>().unwrap(), ProviderType::Ollama);
        assert!("bard".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_set_provider_resets_endpoint() {
        let mut config = Config::default();
        config.llm.provider = ProviderType::OpenAi;
        config.set_provider(ProviderType::Ollama);
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.llm.model, "qwen3:8b");

        config.set_model("llama3.1");
        config.set_provider(ProviderType::Ollama);
        assert_eq!(config.llm.model, "llama3.1");
    }

    #[test]
    fn test_validate_rejects_zero_steps() {
        let mut config = Config::default();
        config.agent.max_steps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.agent.max_steps = 4;
        config.set_model("gpt-4o-mini");
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.agent.max_steps, 4);
        assert_eq!(loaded.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[agent]\nmax_steps = 4\n\n[email]\ntransport = \"smtp\"\n").unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        let defaults = Config::default();
        assert_eq!(loaded.agent.max_steps, 4);
        assert_eq!(loaded.agent.reasoning_retries, defaults.agent.reasoning_retries);
        assert_eq!(loaded.agent.tool_timeout_secs, defaults.agent.tool_timeout_secs);
        assert_eq!(loaded.email.transport, EmailTransport::Smtp);
        assert_eq!(loaded.email.smtp_port, defaults.email.smtp_port);
        assert_eq!(loaded.llm.provider, defaults.llm.provider);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[agent]\nmax_steps = \"many\"\n").unwrap();

        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_email_transport_parse() {
        assert_eq!("SMTP".parse::<EmailTransport>().unwrap(), EmailTransport::Smtp);
        assert_eq!("sendgrid".parse::<EmailTransport>().unwrap(), EmailTransport::SendGrid);
        assert!("pigeon".parse::<EmailTransport>().is_err());
    }

    #[test]
    fn test_default_toml_has_no_secrets() {
        let toml_str = Config::default_config_toml();
        assert!(toml_str.contains("max_steps"));
        assert!(!toml_str.contains("api_key"));
        assert!(!toml_str.contains("smtp_password"));
    }
}
