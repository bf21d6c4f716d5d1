//! Application settings and configuration management

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Audio node address as `host:port`
    pub node_addr: String,
    /// Password for the audio node
    pub node_password: String,
    /// Bot user id announced to the node
    #[serde(default)]
    pub bot_user_id: u64,
    /// Default search source for free-text queries
    #[serde(default = "default_search_source")]
    pub search_source: String,
}

fn default_search_source() -> String {
    "soundcloud".to_string()
}

/// Error types for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    ParseError(String),
    ValidationError(String),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::ParseError(s) => write!(f, "Parse error: {}", s),
            ConfigError::ValidationError(s) => write!(f, "Validation error: {}", s),
        }
    }
}

impl Error for ConfigError {}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            node_addr: "localhost:2333".to_string(),
            node_password: String::new(),
            bot_user_id: 0,
            search_source: default_search_source(),
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when none exists
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self)?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("radiola").join("config.json")
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_addr.is_empty() {
            return Err(ConfigError::ValidationError(
                "Audio node address cannot be empty".to_string(),
            ));
        }

        if self.node_password.is_empty() {
            return Err(ConfigError::ValidationError(
                "Audio node password cannot be empty".to_string(),
            ));
        }

        if self.search_source.parse::<crate::node::SearchSource>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Unknown search source: {}",
                self.search_source
            )));
        }

        Ok(())
    }
}
