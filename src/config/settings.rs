//! Configuration settings for Curio.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no key is set in the config file.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Shown wherever a missing API key stops the agent.
pub const MISSING_API_KEY: &str = "OPENAI_API_KEY not found. Please set the environment variable \
    or add api_key under [openai] in the config file.";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub agent: AgentSettings,
    pub search: SearchSettings,
    pub pacing: PacingSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// OpenAI connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API key secret. Takes precedence over `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Alternative API base URL (proxies, compatible servers).
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            timeout_seconds: 300,
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Chat model used for reasoning.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum number of model turns per question.
    pub max_iterations: usize,
    /// Replaces the built-in system prompt when set.
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            max_iterations: 10,
            system_prompt: None,
        }
    }
}

/// Web search tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of hits handed back to the agent.
    pub max_results: usize,
    /// DuckDuckGo HTML endpoint.
    pub endpoint: String,
    /// User agent sent with search requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            user_agent: "Mozilla/5.0 (compatible; Curio/0.1)".to_string(),
            timeout_seconds: 20,
        }
    }
}

/// Display pacing for the narrated reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// Pause after each narrated step, in milliseconds.
    pub step_delay_ms: u64,
    /// Pause between answer words, in milliseconds.
    pub word_delay_ms: u64,
    /// Thoughts longer than this many characters are cut.
    pub thought_max_chars: usize,
    /// Tool results longer than this many characters are cut.
    pub result_max_chars: usize,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: 1500,
            word_delay_ms: 50,
            thought_max_chars: 150,
            result_max_chars: 100,
        }
    }
}

impl PacingSettings {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn word_delay(&self) -> Duration {
        Duration::from_millis(self.word_delay_ms)
    }
}

/// Web UI server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Chat sessions untouched for this many minutes are dropped.
    pub session_idle_minutes: u64,
    /// Most sessions kept at once; the least recently used go first.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            session_idle_minutes: 120,
            max_sessions: 1000,
        }
    }
}

impl ServerSettings {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CurioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("curio")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Resolve the OpenAI API key: config secret first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_value: Option<String>) -> Option<String> {
        self.openai
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env_value.filter(|k| !k.trim().is_empty()))
    }

    /// Settings copy with the configured model replaced, if one is given.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.agent.model = model;
        }
        self
    }
}
