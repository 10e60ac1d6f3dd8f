//! LLM provider factory

use std::sync::Arc;

use crate::core::config::{Config, ProviderType};
use crate::core::Result;
use crate::llm::traits::LLMProvider;
use crate::llm::{OllamaClient, OpenAiProvider};

/// Create a new LLM provider based on configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.llm.provider {
        ProviderType::OpenAi => Arc::new(OpenAiProvider::from_config(config)?),
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)?),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection() {
        let mut config = Config::default();
        config.llm.provider = ProviderType::Ollama;
        assert_eq!(create_provider(&config).unwrap().name(), "ollama");

        config.llm.provider = ProviderType::OpenAi;
        assert_eq!(create_provider(&config).unwrap().name(), "openai");
    }
}
