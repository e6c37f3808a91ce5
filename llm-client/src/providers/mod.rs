//! LLM provider implementations

mod anthropic;
pub mod mock;
mod openai_compatible;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    DeepSeek,
    OpenRouter,
    Anthropic,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deepseek" | "deep-seek" => Ok(Self::DeepSeek),
            "openrouter" => Ok(Self::OpenRouter),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Create a provider instance from a preset and optional config
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;
    let base_url = provider_config.and_then(|c| c.base_url.clone());

    match kind {
        ProviderKind::DeepSeek => {
            let api_key = get_api_key(provider_config, "DEEPSEEK_API_KEY", "DeepSeek")?;
            let provider = match base_url {
                Some(url) => {
                    OpenAICompatibleProvider::new(&preset.model, &url, api_key, "DeepSeek")?
                }
                None => OpenAICompatibleProvider::deepseek(&preset.model, api_key)?,
            };
            Ok(Box::new(provider))
        }
        ProviderKind::OpenRouter => {
            let api_key = get_api_key(provider_config, "OPENROUTER_API_KEY", "OpenRouter")?;
            let provider = match base_url {
                Some(url) => {
                    OpenAICompatibleProvider::new(&preset.model, &url, api_key, "OpenRouter")?
                }
                None => OpenAICompatibleProvider::openrouter(&preset.model, api_key)?,
            };
            Ok(Box::new(provider))
        }
        ProviderKind::Anthropic => {
            let api_key = get_api_key(provider_config, "ANTHROPIC_API_KEY", "Anthropic")?;
            Ok(Box::new(AnthropicProvider::new(&preset.model, api_key)?))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(
    config: Option<&ProviderConfig>,
    env_var: &str,
    provider_name: &str,
) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(env_var).map_err(|_| LlmError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(
            ProviderKind::from_str("deepseek").unwrap(),
            ProviderKind::DeepSeek
        );
        assert_eq!(
            ProviderKind::from_str("OpenRouter").unwrap(),
            ProviderKind::OpenRouter
        );
        assert_eq!(
            ProviderKind::from_str("anthropic").unwrap(),
            ProviderKind::Anthropic
        );
        assert!(ProviderKind::from_str("cohere").is_err());
    }

    #[test]
    fn test_env_var_names() {
        assert_eq!(ProviderKind::DeepSeek.env_var(), "DEEPSEEK_API_KEY");
        assert_eq!(ProviderKind::OpenRouter.env_var(), "OPENROUTER_API_KEY");
        assert_eq!(ProviderKind::Anthropic.env_var(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_get_provider_with_config_key() {
        let preset = ModelPreset {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
        };
        let provider_config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            base_url: None,
        };

        let provider = get_provider(&preset, Some(&provider_config)).unwrap();
        assert_eq!(provider.name(), "DeepSeek");
    }
}
