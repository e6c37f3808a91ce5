//! gen-cards application configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_CHUNK_SIZE: usize = 2000;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_REQUESTS_PER_MINUTE: usize = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenCardsConfig {
    /// Chunk budget in characters for splitting documents
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Whether extracted cards are validated before storage
    #[serde(default = "default_validation")]
    pub validation: bool,

    /// Sampling temperature for extraction requests
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token budget per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request pacing toward the provider
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_validation() -> bool {
    true
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_requests_per_minute() -> usize {
    DEFAULT_REQUESTS_PER_MINUTE
}

impl Default for GenCardsConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            validation: default_validation(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

impl GenCardsConfig {
    /// Get the config file path: ~/.config/gen-cards/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("gen-cards")
            .join("config.toml"))
    }

    /// Load config from file, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
