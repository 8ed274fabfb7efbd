//! Provider configuration
//!
//! Handles API keys, provider selection and endpoint URLs.

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

use crate::{GeminiProvider, LlmProvider, MockProvider, OllamaProvider, OpenAIProvider};

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI API key (env: OPENAI_API_KEY)
    pub openai_api_key: Option<String>,
    /// Gemini API key (env: GEMINI_API_KEY)
    pub gemini_api_key: Option<String>,
    /// Ollama base URL (default: http://localhost:11434)
    pub ollama_url: String,
    /// Provider to build (env: AGORA_PROVIDER)
    pub provider: String,
    /// Model name (env: AGORA_MODEL); empty means the provider's default
    pub model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gemini_api_key: None,
            ollama_url: "http://localhost:11434".to_string(),
            provider: "ollama".to_string(),
            model: None,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            provider: env::var("AGORA_PROVIDER").unwrap_or(defaults.provider),
            model: env::var("AGORA_MODEL").ok().filter(|m| !m.is_empty()),
        }
    }

    /// Check if a provider is configured
    pub fn is_configured(&self, provider: &str) -> bool {
        match provider.to_lowercase().as_str() {
            "openai" => self.openai_api_key.is_some(),
            "gemini" => self.gemini_api_key.is_some(),
            "ollama" | "mock" => true,
            _ => false,
        }
    }

    /// List available providers
    pub fn available_providers(&self) -> Vec<&str> {
        let mut providers = vec!["mock", "ollama"];
        if self.openai_api_key.is_some() {
            providers.push("openai");
        }
        if self.gemini_api_key.is_some() {
            providers.push("gemini");
        }
        providers
    }

    /// Build the configured provider
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        let provider: Arc<dyn LlmProvider> = match self.provider.to_lowercase().as_str() {
            "mock" => Arc::new(MockProvider::smart()),
            "ollama" => Arc::new(OllamaProvider::with_url(
                &self.ollama_url,
                self.model.as_deref().unwrap_or("llama3"),
            )),
            "openai" => {
                let key = self
                    .openai_api_key
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;
                Arc::new(OpenAIProvider::new(
                    key,
                    self.model.as_deref().unwrap_or("gpt-4o-mini"),
                ))
            }
            "gemini" => {
                let key = self
                    .gemini_api_key
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;
                Arc::new(GeminiProvider::new(
                    key,
                    self.model.as_deref().unwrap_or("gemini-1.5-flash"),
                ))
            }
            other => return Err(ConfigError::UnknownProvider(other.to_string())),
        };
        tracing::info!(provider = %provider.name(), "Completion provider ready");
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, "ollama");
        assert!(config.is_configured("mock"));
        assert!(!config.is_configured("openai"));
        assert_eq!(config.available_providers(), vec!["mock", "ollama"]);
    }

    #[test]
    fn test_build_requires_key() {
        let config = LlmConfig {
            provider: "gemini".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            config.build_provider(),
            Err(ConfigError::MissingEnvVar(var)) if var == "GEMINI_API_KEY"
        ));
    }

    #[test]
    fn test_build_mock_and_unknown() {
        let mock = LlmConfig {
            provider: "Mock".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(mock.build_provider().unwrap().name(), "smart-mock");

        let unknown = LlmConfig {
            provider: "telepathy".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            unknown.build_provider(),
            Err(ConfigError::UnknownProvider(_))
        ));
    }
}
