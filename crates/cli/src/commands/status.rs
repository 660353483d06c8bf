//! Status command handler.

use super::{print_json, DEFAULT_BASE};
use clap::Args;
use korqa_core::{config::AppConfig, AppResult};
use korqa_prompt::list_prompts;

/// Show knowledge base status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Knowledge base name
    #[arg(short, long, default_value = DEFAULT_BASE)]
    pub base: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command for base '{}'", self.base);

        let stats = korqa_knowledge::stats(&config.workspace, &self.base)?;

        if self.json {
            return print_json(&stats);
        }

        let state = if stats.passages_count > 0 { "ready" } else { "empty" };
        println!("Knowledge base: {} ({})", stats.base_name, state);
        println!("  Passages: {}", stats.passages_count);
        if let Some(embedding) = &stats.embedding {
            println!("  Embedding: {}", embedding);
        }
        println!("  DB size: {} bytes", stats.db_size_bytes);
        if let Some(loaded) = stats.last_loaded_at {
            println!("  Last load: {}", loaded);
        }

        let overrides = list_prompts(&config.workspace)?;
        if !overrides.is_empty() {
            println!("  Prompt overrides: {}", overrides.join(", "));
        }

        Ok(())
    }
}
