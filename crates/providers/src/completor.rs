//! Adapts a [`Provider`] to the single-prompt [`Completor`] contract.

use std::sync::Arc;
use async_trait::async_trait;
use medassist_core::dialogue::Completor;
use medassist_core::error::ProviderError;
use medassist_core::provider::{Provider, ProviderRequest};
use tracing::debug;

/// Sends each prompt as one user message to a fixed model.
pub struct ProviderCompletor {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ProviderCompletor {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl Completor for ProviderCompletor {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::single_prompt(&self.model, prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                total_tokens = usage.total_tokens,
                "Completion usage"
            );
        }

        let content = response.message.content;
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse(format!(
                "model '{}' returned no content",
                response.model
            )));
        }
        Ok(content)
    }
}
