//! Data types shared by the quality stages.

use serde::{Deserialize, Serialize};

use super::keywords::StopWords;

/// Opaque key/value metadata carried alongside a candidate.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A retrieved passage travelling through the quality pipeline.
///
/// `relevance_score` and `keyword_overlap` are filled in by the filter for
/// candidates that pass every gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    pub similarity: f64,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_overlap: Option<usize>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, body: impl Into<String>, similarity: f64) -> Self {
        Self {
            id: id.into(),
            title: None,
            body: body.into(),
            similarity,
            metadata: Metadata::new(),
            relevance_score: None,
            keyword_overlap: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// String metadata value, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Gate thresholds for [`ResultQualityFilter`](super::ResultQualityFilter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
    #[serde(default = "default_min_keyword_overlap")]
    pub min_keyword_overlap: usize,
}

fn default_similarity_threshold() -> f64 {
    0.6
}

fn default_relevance_threshold() -> f64 {
    0.3
}

fn default_min_keyword_overlap() -> usize {
    2
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            relevance_threshold: default_relevance_threshold(),
            min_keyword_overlap: default_min_keyword_overlap(),
        }
    }
}

/// Weights of the relevance score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceWeights {
    pub keyword_overlap: f64,
    pub context_similarity: f64,
    pub title: f64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            keyword_overlap: 0.4,
            context_similarity: 0.4,
            title: 0.2,
        }
    }
}

/// Weights of the ordering key applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub similarity: f64,
    pub relevance: f64,
}

impl RankingWeights {
    pub fn combined(&self, candidate: &Candidate) -> f64 {
        self.similarity * candidate.similarity
            + self.relevance * candidate.relevance_score.unwrap_or(0.0)
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            similarity: 0.7,
            relevance: 0.3,
        }
    }
}

/// Weights of the answer confidence components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub context_relevance: f64,
    pub answer_context_match: f64,
    pub qa_relevance: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            context_relevance: 0.4,
            answer_context_match: 0.3,
            qa_relevance: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default)]
    pub relevance: RelevanceWeights,
    #[serde(default)]
    pub ranking: RankingWeights,
    #[serde(default)]
    pub confidence: ConfidenceWeights,
}

/// Answer post-processing knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    #[serde(default = "default_max_answer_chars")]
    pub max_answer_chars: usize,
    #[serde(default = "default_sentence_terminators")]
    pub sentence_terminators: Vec<char>,
}

fn default_max_answer_chars() -> usize {
    200
}

fn default_sentence_terminators() -> Vec<char> {
    vec!['.', '?', '!']
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_answer_chars: default_max_answer_chars(),
            sentence_terminators: default_sentence_terminators(),
        }
    }
}

/// Everything the quality stages can be configured with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualitySettings {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub stop_words: StopWords,
    #[serde(default)]
    pub refine: RefineConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.relevance.keyword_overlap, 0.4);
        assert_eq!(weights.relevance.context_similarity, 0.4);
        assert_eq!(weights.relevance.title, 0.2);
        assert_eq!(weights.ranking.similarity, 0.7);
        assert_eq!(weights.ranking.relevance, 0.3);
        assert_eq!(weights.confidence.context_relevance, 0.4);
        assert_eq!(weights.confidence.answer_context_match, 0.3);
        assert_eq!(weights.confidence.qa_relevance, 0.3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "filter:\n  similarity_threshold: 0.5\nrefine:\n  max_answer_chars: 120\n";
        let settings: QualitySettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.filter.similarity_threshold, 0.5);
        assert_eq!(settings.filter.relevance_threshold, 0.3);
        assert_eq!(FilterConfig::default().similarity_threshold, 0.6);
        assert_eq!(settings.filter.min_keyword_overlap, 2);
        assert_eq!(settings.refine.max_answer_chars, 120);
        assert_eq!(settings.refine.sentence_terminators, vec!['.', '?', '!']);
        assert_eq!(settings.stop_words, StopWords::korean());
    }

    #[test]
    fn test_combined_score_without_relevance() {
        let ranking = RankingWeights::default();
        let candidate = Candidate::new("a", "본문", 0.5);
        assert!((ranking.combined(&candidate) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_serialization_skips_empty_annotations() {
        let candidate = Candidate::new("doc-1", "본문", 0.8);
        let json = serde_json::to_value(&candidate).unwrap();
        assert!(json.get("relevance_score").is_none());
        assert!(json.get("title").is_none());
        assert_eq!(json["similarity"], 0.8);
    }
}
