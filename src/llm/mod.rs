//! LLM backends.
//!
//! Extraction talks to models through the [`LlmClient`] trait so the provider
//! stays pluggable. [`ChatCompletionsClient`] speaks the OpenAI-compatible
//! chat-completions API, which covers Perplexity, OpenAI, and a local Ollama
//! runner; [`LlmBackend`] picks the endpoint and default model.

mod chat;
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chat::ChatCompletionsClient;
pub use error::LlmError;

use crate::config::Config;

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Optional sampling parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model requests are sent to.
    fn model(&self) -> &str;

    /// Send a chat completion request and return the first choice's text.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, LlmError>;
}

/// Which provider extraction requests go to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    Perplexity,
    OpenAi,
    /// Local model runner; needs no API key.
    Ollama,
    Disabled,
}

impl LlmBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Perplexity => "perplexity",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Disabled => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perplexity" => Some(Self::Perplexity),
            "openai" => Some(Self::OpenAi),
            "ollama" => Some(Self::Ollama),
            "none" | "disabled" | "off" => Some(Self::Disabled),
            _ => None,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Perplexity => "https://api.perplexity.ai",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
            Self::Disabled => "",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Perplexity => "llama-3.1-sonar-small-128k-online",
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => "llama3.1",
            Self::Disabled => "",
        }
    }

    fn requires_key(&self) -> bool {
        matches!(self, Self::Perplexity | Self::OpenAi)
    }
}

/// Build the configured client, or `None` when AI extraction is unavailable.
pub fn client_from_config(config: &Config) -> Option<Arc<dyn LlmClient>> {
    let backend = config.backend;
    if backend == LlmBackend::Disabled {
        tracing::info!("AI extraction disabled, using heuristic extraction only");
        return None;
    }
    if backend.requires_key() && config.api_key.is_none() {
        tracing::warn!(
            "No API key configured for {}, using heuristic extraction only",
            backend.as_str()
        );
        return None;
    }

    let base_url = match (backend, &config.ollama_host) {
        (LlmBackend::Ollama, Some(host)) => format!("{}/v1", host.trim_end_matches('/')),
        _ => backend.default_base_url().to_string(),
    };
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| backend.default_model().to_string());

    tracing::info!("AI extraction via {} ({})", backend.as_str(), model);
    Some(Arc::new(ChatCompletionsClient::new(
        base_url,
        model,
        config.api_key.clone(),
    )))
}
