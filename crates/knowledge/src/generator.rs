//! Answer generation capability consumed by the QA pipeline.

use async_trait::async_trait;
use korqa_core::{AppError, AppResult};
use korqa_llm::{LlmClient, LlmRequest};
use korqa_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produce one complete answer for `question` grounded in `context`.
    async fn generate(&self, question: &str, context: &str) -> AppResult<String>;
}

/// Generator backed by an [`LlmClient`] and a QA prompt template.
pub struct LlmGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl LlmGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }
}

#[async_trait]
impl AnswerGenerator for LlmGenerator {
    async fn generate(&self, question: &str, context: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), context.to_string());

        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(self.prompt.behavior.temperature)
            .with_max_tokens(self.prompt.behavior.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            provider = self.client.provider_name(),
            model = %self.model,
            prompt = %self.prompt.id,
            "Generating answer"
        );

        let response = self.client.complete(&request).await.map_err(|e| match e {
            AppError::Llm(_) => e,
            other => AppError::Llm(format!("Answer generation failed: {}", other)),
        })?;
        tracing::debug!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            "Draft answer received"
        );

        Ok(response.content)
    }
}
