//! Configuration loading and management for listing-scribe.
//!
//! Loads settings from `listing-scribe.toml` with environment variable overrides
//! for the endpoint. Every section has defaults, so the file itself is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "listing-scribe.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full URL of the OpenAI-compatible chat completions endpoint
    pub url: String,
    /// Model identifier (e.g., "tinyllama:latest")
    pub model: String,
    /// Per-request timeout. Unset means requests wait indefinitely.
    pub timeout_secs: Option<u64>,
}

/// Input file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// CSV file of property listings
    pub path: PathBuf,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base path for data storage
    pub path: PathBuf,
}

/// Title/description rewrite job settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Rewritten titles are cut to this many characters before storage
    pub title_max_chars: usize,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl Config {
    /// Load configuration from the default location (listing-scribe.toml in cwd or home).
    ///
    /// Falls back to the built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                let mut config = Config::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LISTING_SCRIBE_LLM_URL") {
            self.llm.url = url;
        }
        if let Ok(model) = std::env::var("LISTING_SCRIBE_LLM_MODEL") {
            self.llm.model = model;
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home
                .join(".config")
                .join("listing-scribe")
                .join(CONFIG_FILE);
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }
}

impl LlmConfig {
    /// Request timeout for the completion endpoint, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:11434/v1/chat/completions".to_string(),
            model: "tinyllama:latest".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("hotel_datas.csv"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            title_max_chars: 150,
        }
    }
}
