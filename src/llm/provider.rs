use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LLMConfig;
use crate::types::{AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// A configured chat model: the adapter to call plus the model id it serves
#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider: LLMProvider,
    model: String,
}

impl LLM {
    pub fn new(config: &LLMConfig) -> Self {
        let adapter: Arc<dyn LLMAdapter> = match config.provider {
            LLMProvider::Groq => Arc::new(crate::llm::groq::GroqAdapter::with_api_base(
                &config.api_key,
                &config.api_base,
            )),
            LLMProvider::OpenAI => Arc::new(crate::llm::openai::OpenAIAdapter::new_with_api_base(
                &config.api_key,
                &config.api_base,
            )),
        };

        Self {
            adapter,
            provider: config.provider.clone(),
            model: config.model.clone(),
        }
    }

    /// Wrap an existing adapter
    pub fn with_adapter(adapter: Arc<dyn LLMAdapter>, provider: LLMProvider, model: impl Into<String>) -> Self {
        Self {
            adapter,
            provider,
            model: model.into(),
        }
    }

    pub fn provider(&self) -> &LLMProvider {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
