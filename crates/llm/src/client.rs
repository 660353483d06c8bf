//! Generation client seam used by the answer generator.
//!
//! The knowledge crate only ever sends one rendered prompt pair (system and
//! user) per question and reads back the draft answer text.

use korqa_core::AppResult;
use serde::{Deserialize, Serialize};

/// One answer-generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Rendered user prompt: question plus retrieved passages
    pub prompt: String,

    /// Generation model, e.g. `qwen2:1.5b-instruct`
    pub model: String,

    /// Cap on the draft answer length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature from the prompt's behavior block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Rendered system prompt (answering rules)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// Request with only the prompt and model set.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            system: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Draft answer returned by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Raw draft, before validation and refinement
    pub content: String,

    /// Model name as reported by the provider
    pub model: String,

    pub usage: LlmUsage,
}

/// Token counts, logged per question at debug level.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Text generation backend.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short backend name used in logs.
    fn provider_name(&self) -> &str;

    /// Generate a draft answer. Transport failures surface as `AppError::Llm`.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
