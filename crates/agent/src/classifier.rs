//! LLM-backed follow-up classifier.
//!
//! Asks the model for a JSON object matching a fixed schema and
//! deserializes it into [`Classification`]. Anything that does not match
//! the schema exactly is a [`ClassifierError::Malformed`].

use std::sync::Arc;
use async_trait::async_trait;
use medassist_core::dialogue::{Classification, ClassificationInput, QueryClassifier};
use medassist_core::error::ClassifierError;
use medassist_core::provider::{Provider, ProviderRequest, ResponseFormat};
use tracing::debug;

use crate::prompt::classification_prompt;

const SCHEMA_NAME: &str = "query_classification";

/// JSON schema sent with every classification request.
pub fn classification_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "is_followup": { "type": "boolean" },
            "requires_new_context": { "type": "boolean" }
        },
        "required": ["is_followup", "requires_new_context"],
        "additionalProperties": false
    })
}

/// Parse the model's reply, tolerating a surrounding Markdown code fence.
pub fn parse_classification(content: &str) -> Result<Classification, ClassifierError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body).map_err(|e| ClassifierError::Malformed(format!("{e}: {body}")))
}

pub struct LlmQueryClassifier {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl LlmQueryClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    fn build_request(&self, input: &ClassificationInput<'_>) -> ProviderRequest {
        let mut request = ProviderRequest::single_prompt(&self.model, classification_prompt(input));
        request.temperature = self.temperature;
        request.max_tokens = Some(64);
        request.response_format = Some(ResponseFormat::JsonSchema {
            name: SCHEMA_NAME.into(),
            schema: classification_schema(),
            strict: true,
        });
        request
    }
}

#[async_trait]
impl QueryClassifier for LlmQueryClassifier {
    async fn classify(
        &self,
        input: &ClassificationInput<'_>,
    ) -> Result<Classification, ClassifierError> {
        let response = self.provider.complete(self.build_request(input)).await?;
        let verdict = parse_classification(&response.message.content)?;
        debug!(
            is_followup = verdict.is_followup,
            requires_new_context = verdict.requires_new_context,
            "Query classified"
        );
        Ok(verdict)
    }
}
