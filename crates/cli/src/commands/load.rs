//! Load command handler.
//!
//! Parses a KorQuAD file into the passage index of a knowledge base.

use super::{print_json, DEFAULT_BASE};
use clap::Args;
use korqa_core::{config::AppConfig, AppError, AppResult};
use korqa_knowledge::{ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Load a KorQuAD corpus into a knowledge base
#[derive(Args, Debug)]
pub struct LoadCommand {
    /// Knowledge base name
    #[arg(short, long, default_value = DEFAULT_BASE)]
    pub base: String,

    /// Path to a KorQuAD v1 JSON file
    #[arg(short, long, env = "KORQA_DATA")]
    pub data: Option<PathBuf>,

    /// Drop the existing index before loading
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl LoadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing load command for base '{}'", self.base);

        let reporter = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| {
                eprintln!("{}", event.format_simple());
            }))
        };

        let loader = korqa_knowledge::open_loader(&config.workspace, &self.base, reporter).await?;
        loader.initialize(self.data.as_deref(), self.reset).await?;

        let status = loader.status();
        let stats = status
            .stats
            .clone()
            .ok_or_else(|| AppError::Knowledge("Loader finished without statistics".to_string()))?;

        if self.json {
            print_json(&status)?;
        } else if stats.articles == 0 {
            println!(
                "Knowledge base '{}' already holds {} passages (use --reset to reload)",
                self.base, stats.passages
            );
        } else {
            println!(
                "Loaded {} passages from {} articles ({} paragraphs) in {:.2}s",
                stats.passages, stats.articles, stats.paragraphs, stats.duration_secs
            );
        }

        Ok(())
    }
}
