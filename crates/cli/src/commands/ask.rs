//! Ask command handler.
//!
//! Runs the full retrieve, filter, generate, validate, refine pipeline.

use super::{print_json, DEFAULT_BASE};
use clap::Args;
use korqa_core::{config::AppConfig, AppResult};
use korqa_knowledge::{AnswerOutcome, AskOptions, LlmGenerator};
use korqa_llm::create_client;
use korqa_prompt::{load_prompt_or_default, QA_ANSWER_PROMPT_ID};
use std::sync::Arc;

/// Answer a question from the knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    /// Knowledge base name
    #[arg(short, long, default_value = DEFAULT_BASE)]
    pub base: String,

    /// Number of passages handed to the model
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command against base '{}'", self.base);
        tracing::debug!("Ask command options: {:?}", self);

        config.validate()?;

        let timeout = config
            .get_provider_config(&config.provider)
            .and_then(|pc| pc.timeout);
        let client = create_client(&config.provider, config.provider_endpoint(), timeout)?;
        let prompt = load_prompt_or_default(&config.workspace, QA_ANSWER_PROMPT_ID)?;
        let generator = Arc::new(LlmGenerator::new(client, &config.model, prompt));

        let options = AskOptions {
            base_name: self.base.clone(),
            question: self.question.clone(),
            top_k: self.top_k,
        };
        let response = korqa_knowledge::ask(&config.workspace, options, generator).await?;

        if self.json {
            return print_json(&response);
        }

        println!("Answer:");
        println!("{}", response.answer);
        println!();

        match response.outcome {
            AnswerOutcome::NoDocuments | AnswerOutcome::NoRelevantDocuments => {
                println!("Source: (no trusted passage)");
            }
            AnswerOutcome::Answered | AnswerOutcome::InvalidAnswer => {
                println!("Source: {}", response.document_id);
            }
        }

        if let Some(report) = &response.quality_metrics {
            println!(
                "Confidence: {:.3} ({})",
                report.confidence, report.verdict.message
            );
            if let Some(metrics) = report.search_quality.metrics() {
                println!(
                    "Passages: {} kept, avg similarity {:.3}, avg relevance {:.3}",
                    metrics.total_results, metrics.avg_similarity_score, metrics.avg_relevance_score
                );
            }
        }

        Ok(())
    }
}
