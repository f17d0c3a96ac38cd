//! Configuration settings for Samtale.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub storage: StorageSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub finance: FinanceSettings,
    pub youtube: YoutubeSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.samtale".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Model backend settings.
///
/// The backend is any OpenAI-compatible chat endpoint; the default points at
/// a local Ollama daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of the chat completions API.
    pub base_url: String,
    /// Model identifier, shared by all agents.
    pub id: String,
    /// API key sent to the backend. Ollama ignores it but requires a value.
    pub api_key: String,
    /// Timeout for a single model call.
    pub timeout_seconds: u64,
    /// Maximum tool calls an agent may make while answering one message.
    pub max_tool_calls: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            id: "llama3.2".to_string(),
            api_key: "ollama".to_string(),
            timeout_seconds: 300,
            max_tool_calls: 10,
        }
    }
}

/// Conversation store provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// SQLite file (default).
    #[default]
    Sqlite,
    /// Process memory, lost on exit.
    Memory,
}

impl std::str::FromStr for StorageProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StorageProvider::Sqlite),
            "memory" => Ok(StorageProvider::Memory),
            _ => Err(format!("Unknown storage provider: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::Sqlite => write!(f, "sqlite"),
            StorageProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Conversation storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage provider (sqlite, memory).
    pub provider: StorageProvider,
    /// Path to the SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Sqlite,
            sqlite_path: "~/.samtale/agents.db".to_string(),
        }
    }
}

/// HTTP playground settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound for one agent run; the run is abandoned when exceeded.
    pub request_timeout_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            request_timeout_seconds: 600,
        }
    }
}

/// Web search tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default number of results per search.
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

/// Financial data tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceSettings {
    /// Yahoo Finance API host.
    pub base_url: String,
}

impl Default for FinanceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

/// YouTube tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Preferred caption language.
    pub captions_language: String,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            captions_language: "en".to_string(),
        }
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
            Some(p) => p.clone(),
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
            .map_err(|e| crate::error::SamtaleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("samtale")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.storage.sqlite_path)
    }
}
