//! LLM module - Language Model integrations
//!
//! Provides abstractions over OpenAI-compatible endpoints and Ollama.

pub mod ollama;
pub mod openai;
pub mod provider;
pub mod traits;

pub use ollama::OllamaClient;
pub use openai::OpenAiProvider;
pub use provider::create_provider;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
