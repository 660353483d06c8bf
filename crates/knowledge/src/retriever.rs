//! Retrieval capability consumed by the QA pipeline.

use crate::embeddings::EmbeddingProvider;
use crate::index::PassageIndex;
use crate::quality::Candidate;
use async_trait::async_trait;
use korqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Returns candidates ordered by similarity, each in [0, 1] with 1 meaning
/// identical.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Candidate>>;
}

/// Embeds the query and searches a [`PassageIndex`].
#[derive(Debug, Clone)]
pub struct IndexRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<PassageIndex>,
}

impl IndexRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<PassageIndex>) -> Self {
        Self { embedder, index }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Candidate>> {
        let query_embedding = self.embedder.embed(query).await.map_err(|e| match e {
            AppError::Embedding(_) => e,
            other => AppError::Embedding(format!("Failed to embed query: {}", other)),
        })?;

        let mut candidates = self
            .index
            .search(&query_embedding, limit)
            .map_err(|e| match e {
                AppError::Retrieval(_) => e,
                other => AppError::Retrieval(other.to_string()),
            })?;

        for candidate in &mut candidates {
            candidate.similarity = round4(candidate.similarity);
        }

        tracing::debug!(
            limit,
            returned = candidates.len(),
            top = candidates.first().map(|c| c.similarity),
            "Retrieved candidates"
        );
        Ok(candidates)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
