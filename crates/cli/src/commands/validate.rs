//! Validate command handler.

use super::{print_json, DEFAULT_BASE};
use clap::Args;
use korqa_core::{config::AppConfig, AppResult};
use korqa_knowledge::config::load_config;
use korqa_knowledge::QualityManager;

/// Score an answer against a context without calling a model
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Question the answer responds to
    #[arg(long, default_value = "")]
    pub question: String,

    /// Answer text to check
    #[arg(long)]
    pub answer: String,

    /// Context the answer should be grounded in
    #[arg(long)]
    pub context: String,

    /// Knowledge base whose quality settings are used
    #[arg(short, long, default_value = DEFAULT_BASE)]
    pub base: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing validate command");

        let base_config = load_config(&config.workspace, &self.base)?;
        let quality = QualityManager::new(&base_config.quality);
        let verdict = quality
            .validator()
            .validate(&self.question, &self.answer, &self.context);

        if self.json {
            return print_json(&verdict);
        }

        println!("Valid: {}", verdict.is_valid);
        println!("Confidence: {:.3}", verdict.confidence);
        println!("  context relevance:    {:.3}", verdict.context_relevance);
        println!("  answer/context match: {:.3}", verdict.answer_context_match);
        println!("  question/answer:      {:.3}", verdict.qa_relevance);
        println!("{}", verdict.message);

        Ok(())
    }
}
