//! Knowledge base and question answering for KorQA.
//!
//! Passages from a KorQuAD corpus are embedded into a local SQLite index.
//! Questions go through retrieval, the [`quality`] gates, generation and
//! answer validation in [`rag::QaPipeline`].

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod generator;
pub mod index;
pub mod loader;
pub mod progress;
pub mod quality;
pub mod rag;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use generator::{AnswerGenerator, LlmGenerator};
pub use index::PassageIndex;
pub use loader::{DataLoader, LoadStatus, LoaderState};
pub use progress::{ProgressEvent, ProgressReporter};
pub use quality::{Candidate, FilterConfig, QualityManager, QualityVerdict};
pub use rag::{AnswerOutcome, QaPipeline, QaResponse};
pub use retriever::{IndexRetriever, Retriever};
pub use types::{AskOptions, BaseStats, KnowledgeBaseConfig, LoadStats, Passage};

use chrono::{DateTime, Utc};
use korqa_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Build a loader for `base_name`, creating the index and persisting the
/// effective config on first use.
pub async fn open_loader(
    workspace: &Path,
    base_name: &str,
    reporter: ProgressReporter,
) -> AppResult<DataLoader> {
    let config = config::load_config(workspace, base_name)?;
    let index_path = config::get_index_path(workspace, base_name);
    let index = Arc::new(PassageIndex::open(&index_path)?);
    let embedder = embeddings::create_provider(&config.embedding).await?;

    config::save_config(workspace, &config)?;

    Ok(DataLoader::new(index, embedder, config).with_reporter(reporter))
}

/// Build the QA pipeline for an already loaded base.
pub async fn open_pipeline(
    workspace: &Path,
    base_name: &str,
    generator: Arc<dyn AnswerGenerator>,
) -> AppResult<QaPipeline> {
    let config = config::load_config(workspace, base_name)?;

    let index_path = config::get_index_path(workspace, base_name);
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' has no index. Run 'korqa load' first.",
            base_name
        )));
    }

    let index = Arc::new(PassageIndex::open(&index_path)?);
    let embedder = embeddings::create_provider(&config.embedding).await?;
    let retriever = Arc::new(IndexRetriever::new(embedder, index));

    Ok(
        QaPipeline::new(retriever, generator, QualityManager::new(&config.quality))
            .with_retrieval_multiplier(config.retrieval_multiplier),
    )
}

/// Answer a question against a base.
pub async fn ask(
    workspace: &Path,
    options: AskOptions,
    generator: Arc<dyn AnswerGenerator>,
) -> AppResult<QaResponse> {
    tracing::info!(
        "Answering question against knowledge base '{}'",
        options.base_name
    );

    let pipeline = open_pipeline(workspace, &options.base_name, generator).await?;
    pipeline.answer(&options.question, options.top_k).await
}

/// Clean (reset) a knowledge base.
pub fn clean(workspace: &Path, base_name: &str) -> AppResult<()> {
    tracing::info!("Cleaning knowledge base '{}'", base_name);

    let index_path = config::get_index_path(workspace, base_name);
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist",
            base_name
        )));
    }

    PassageIndex::open(&index_path)?.reset()?;

    tracing::info!("Knowledge base '{}' cleaned", base_name);
    Ok(())
}

/// Get statistics for a knowledge base.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    let index_path = config::get_index_path(workspace, base_name);
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist",
            base_name
        )));
    }

    let index = PassageIndex::open(&index_path)?;
    let passages_count = index.count()?;
    let embedding = index.get_meta(loader::META_EMBEDDING)?;
    let last_loaded_at = index
        .get_meta(loader::META_LOADED_AT)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let db_size_bytes = std::fs::metadata(&index_path).map(|m| m.len()).unwrap_or(0);

    Ok(BaseStats {
        base_name: base_name.to_string(),
        passages_count,
        embedding,
        db_size_bytes,
        last_loaded_at,
    })
}
