//! LLM client module
//!
//! Provides interfaces for communicating with LLM providers:
//! - OpenAI-compatible API (OpenAI, Ollama, LM Studio, OpenRouter)
//! - Google Generative AI (Gemini)
//!
//! The agent talks to models only through [`CompletionBackend`], so tests
//! and retries can wrap or replace the HTTP client.

pub mod chat;
pub mod client;
pub mod retry;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, MessageRole, TokenUsage};
pub use client::{LlmClient, LlmProvider};
pub use retry::{RetryConfig, RetryingBackend};

use crate::error::Result;
use std::time::Duration;

/// LLM Configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// API endpoint base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// API key (if required)
    pub api_key: Option<String>,
    /// Maximum tokens in response
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// System prompt sent with every request
    pub system_prompt: Option<String>,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(
        provider: LlmProvider,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        LlmConfig {
            provider,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            max_tokens: Some(2048),
            temperature: Some(0.0),
            system_prompt: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set temperature, clamped to 0.0 - 2.0
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Text produced by a backend for one prompt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Anything that can turn a prompt into text
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<Completion>;

    /// Short name for logs
    fn name(&self) -> &str {
        "backend"
    }
}

#[async_trait::async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for std::sync::Arc<B> {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<Completion> {
        (**self).complete(prompt, system).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
