//! Knowledge base type definitions.

use crate::embeddings::EmbeddingConfig;
use crate::quality::{Metadata, QualitySettings};
use crate::rag::DEFAULT_RETRIEVAL_MULTIPLIER;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for a knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base
    #[serde(default)]
    pub name: String,

    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Raw candidates requested per passage returned to the generator
    #[serde(default = "default_retrieval_multiplier")]
    pub retrieval_multiplier: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Filter thresholds, scoring weights, stop words, refinement
    #[serde(default)]
    pub quality: QualitySettings,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_retrieval_multiplier() -> usize {
    DEFAULT_RETRIEVAL_MULTIPLIER
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            retrieval_multiplier: default_retrieval_multiplier(),
            embedding: EmbeddingConfig::default(),
            quality: QualitySettings::default(),
        }
    }
}

/// A corpus passage before embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Options for the ask operation.
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Knowledge base name
    pub base_name: String,

    /// Question text
    pub question: String,

    /// Number of passages handed to the generator
    pub top_k: usize,
}

/// Statistics from a load operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadStats {
    pub articles: usize,
    pub paragraphs: usize,
    pub passages: usize,
    pub duration_secs: f64,
}

/// Statistics for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStats {
    /// Base name
    pub base_name: String,

    /// Number of indexed passages
    pub passages_count: u64,

    /// Embedding provider/model/dimensions the index was built with
    pub embedding: Option<String>,

    /// Database size in bytes
    pub db_size_bytes: u64,

    /// Last completed load
    pub last_loaded_at: Option<DateTime<Utc>>,
}
