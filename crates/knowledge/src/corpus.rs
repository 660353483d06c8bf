//! KorQuAD v1 corpus parsing.
//!
//! Every paragraph `context` becomes one or more passages. Questions are not
//! indexed; the first question id of a paragraph names the passages cut from
//! it.

use crate::chunker::chunk_text;
use crate::quality::Metadata;
use crate::types::Passage;
use korqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Passages shorter than this many characters count as low quality.
pub const MIN_QUALITY_PASSAGE_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
struct KorQuadFile {
    #[serde(default)]
    version: Option<String>,
    data: Vec<KorQuadArticle>,
}

#[derive(Debug, Deserialize)]
struct KorQuadArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    paragraphs: Vec<KorQuadParagraph>,
}

#[derive(Debug, Deserialize)]
struct KorQuadParagraph {
    context: String,
    #[serde(default)]
    qas: Vec<KorQuadQuestion>,
}

#[derive(Debug, Deserialize)]
struct KorQuadQuestion {
    id: String,
}

/// Passages plus counts of what was read.
#[derive(Debug, Clone, Default)]
pub struct ParsedCorpus {
    pub version: Option<String>,
    pub articles: usize,
    pub paragraphs: usize,
    pub questions: usize,
    pub passages: Vec<Passage>,
}

/// Length statistics over a set of passages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkQuality {
    pub total: usize,
    pub avg_chars: f64,
    pub short_chunks: usize,
    /// Percentage of passages at least [`MIN_QUALITY_PASSAGE_CHARS`] long.
    pub quality_score: f64,
}

/// Parse KorQuAD JSON text into passages.
pub fn parse_korquad(json: &str, chunk_size: usize, overlap: usize) -> AppResult<ParsedCorpus> {
    let file: KorQuadFile = serde_json::from_str(json)
        .map_err(|e| AppError::Knowledge(format!("Failed to parse KorQuAD data: {}", e)))?;

    let mut corpus = ParsedCorpus {
        version: file.version,
        articles: file.data.len(),
        ..Default::default()
    };

    for (a, article) in file.data.iter().enumerate() {
        for (p, paragraph) in article.paragraphs.iter().enumerate() {
            corpus.paragraphs += 1;
            corpus.questions += paragraph.qas.len();

            let original_id = paragraph
                .qas
                .first()
                .map(|qa| qa.id.clone())
                .unwrap_or_else(|| format!("{}-{}", a, p));

            for chunk in chunk_text(&paragraph.context, chunk_size, overlap) {
                let mut metadata = Metadata::new();
                metadata.insert("original_id".to_string(), original_id.clone().into());
                metadata.insert("title".to_string(), article.title.clone().into());
                metadata.insert("source".to_string(), "korquad".into());
                metadata.insert("chunk".to_string(), chunk.position.into());
                metadata.insert("char_start".to_string(), chunk.start.into());
                metadata.insert("char_end".to_string(), chunk.end.into());

                corpus.passages.push(Passage {
                    id: format!("{}#{}", original_id, chunk.position),
                    title: Some(article.title.clone()).filter(|t| !t.is_empty()),
                    body: chunk.text,
                    metadata,
                });
            }
        }
    }

    tracing::debug!(
        articles = corpus.articles,
        paragraphs = corpus.paragraphs,
        passages = corpus.passages.len(),
        "Parsed KorQuAD corpus"
    );

    Ok(corpus)
}

/// Read and parse a KorQuAD JSON file.
pub fn load_korquad(path: &Path, chunk_size: usize, overlap: usize) -> AppResult<ParsedCorpus> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read data file {:?}: {}", path, e))
    })?;
    parse_korquad(&content, chunk_size, overlap)
}

pub fn chunk_quality(passages: &[Passage]) -> ChunkQuality {
    if passages.is_empty() {
        return ChunkQuality {
            total: 0,
            avg_chars: 0.0,
            short_chunks: 0,
            quality_score: 0.0,
        };
    }

    let lengths: Vec<usize> = passages.iter().map(|p| p.body.chars().count()).collect();
    let total = passages.len();
    let short_chunks = lengths
        .iter()
        .filter(|&&len| len < MIN_QUALITY_PASSAGE_CHARS)
        .count();

    ChunkQuality {
        total,
        avg_chars: lengths.iter().sum::<usize>() as f64 / total as f64,
        short_chunks,
        quality_score: (total - short_chunks) as f64 / total as f64 * 100.0,
    }
}
