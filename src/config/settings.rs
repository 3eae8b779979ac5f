use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::agent::COORDINATOR_AGENT_ID;
use crate::chat::ChatSettings;
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Default backend endpoint
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api/agent";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Endpoint of the agent call (JSON POST)
    pub backend_url: String,
    /// Server-sent agent activity stream, if the backend offers one
    pub activity_url: Option<String>,
    /// Agent every call is routed to
    pub agent_id: String,
    /// How long a call may stay in flight before progress is reset
    pub request_timeout: Duration,
    /// Length of auto-generated ticket subjects
    pub subject_max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            activity_url: None,
            agent_id: COORDINATOR_AGENT_ID.to_string(),
            request_timeout: Duration::from_secs(120),
            subject_max_chars: 80,
        }
    }
}

/// TOML representation of the backend section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlBackendConfig {
    pub url: Option<String>,
    pub activity_url: Option<String>,
    pub agent_id: Option<String>,
}

/// TOML representation of the chat section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlChatConfig {
    pub request_timeout_secs: Option<u64>,
    pub subject_max_chars: Option<usize>,
}

/// Root TOML configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub backend: Option<TomlBackendConfig>,
    pub chat: Option<TomlChatConfig>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        Self::load_from(&config_file)
    }

    /// Load from an explicit path. Missing or unparsable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No config file, using defaults");
                return Config::default();
            }
        };
        match Self::from_toml_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Config::default()
            }
        }
    }

    /// Parse TOML and merge it over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let toml_config = toml::from_str::<TomlConfig>(contents)?;
        let mut config = Config::default();
        config.merge(toml_config);
        Ok(config)
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(backend) = toml_config.backend {
            if let Some(url) = backend.url.filter(|u| !u.trim().is_empty()) {
                self.backend_url = url;
            }
            if let Some(activity_url) = backend.activity_url.filter(|u| !u.trim().is_empty()) {
                self.activity_url = Some(activity_url);
            }
            if let Some(agent_id) = backend.agent_id.filter(|a| !a.trim().is_empty()) {
                self.agent_id = agent_id;
            }
        }

        if let Some(chat) = toml_config.chat {
            if let Some(secs) = chat.request_timeout_secs.filter(|s| *s > 0) {
                self.request_timeout = Duration::from_secs(secs);
            }
            if let Some(max) = chat.subject_max_chars.filter(|m| *m > 0) {
                self.subject_max_chars = max;
            }
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "Failed to create config directory");
                return;
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            agent_id: self.agent_id.clone(),
            subject_max_chars: self.subject_max_chars,
        }
    }
}
