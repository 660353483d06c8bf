//! Clean command handler.

use super::DEFAULT_BASE;
use clap::Args;
use korqa_core::{config::AppConfig, AppResult};

/// Remove every passage from a knowledge base
#[derive(Args, Debug)]
pub struct CleanCommand {
    /// Knowledge base name
    #[arg(short, long, default_value = DEFAULT_BASE)]
    pub base: String,
}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command for base '{}'", self.base);

        korqa_knowledge::clean(&config.workspace, &self.base)?;

        println!("Knowledge base '{}' cleaned", self.base);
        Ok(())
    }
}
