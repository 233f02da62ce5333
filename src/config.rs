//! Configuration file support

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Environment variable holding the API key. Its absence is fatal at
/// startup.
pub const API_KEY_VAR: &str = "GROK_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Chat completion endpoint
    #[serde(default = "default_api_url")]
    pub url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Ceiling on the number of tokens in a response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_url() -> String {
    "https://api.x.ai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "grok-1.5".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when no
    /// config file exists
    pub fn load() -> Self {
        Self::default_path()
            .and_then(|path| Self::from_file(path).ok())
            .unwrap_or_default()
    }

    /// Default config file location (`<config dir>/mediscan/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mediscan").join("config.toml"))
    }
}
