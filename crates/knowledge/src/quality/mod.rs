//! Retrieval quality and answer validation.
//!
//! Every stage here is a pure function of its inputs and an immutable
//! configuration, so a single [`QualityManager`] can be shared freely across
//! concurrent requests.

pub mod filter;
pub mod keywords;
pub mod refiner;
pub mod relevance;
pub mod types;
pub mod validator;

pub use filter::{QualityMetrics, ResultQualityFilter, SearchQuality, NO_RESULTS_MESSAGE};
pub use keywords::{KeywordExtractor, KeywordSet, StopWords, KOREAN_STOP_WORDS};
pub use refiner::{
    AnswerRefiner, RefineStatus, RefinedAnswer, EMPTY_ANSWER_MESSAGE, UNSUPPORTED_ANSWER_MESSAGE,
};
pub use relevance::{keyword_overlap_ratio, QueryTerms, RelevanceBreakdown, RelevanceScorer};
pub use types::{
    Candidate, ConfidenceWeights, FilterConfig, Metadata, QualitySettings, RankingWeights,
    RefineConfig, RelevanceWeights, ScoringWeights,
};
pub use validator::{AnswerValidator, QualityVerdict, VerdictReason};

/// The filter, validator and refiner wired from one [`QualitySettings`].
#[derive(Debug, Clone)]
pub struct QualityManager {
    filter: ResultQualityFilter,
    validator: AnswerValidator,
    refiner: AnswerRefiner,
}

impl QualityManager {
    pub fn new(settings: &QualitySettings) -> Self {
        let extractor = KeywordExtractor::new(settings.stop_words.clone());
        let scorer = RelevanceScorer::new(extractor, settings.weights.relevance);

        Self {
            filter: ResultQualityFilter::new(
                settings.filter.clone(),
                scorer.clone(),
                settings.weights.ranking,
            ),
            validator: AnswerValidator::new(
                scorer,
                settings.filter.relevance_threshold,
                settings.weights.confidence,
            ),
            refiner: AnswerRefiner::new(settings.refine.clone()),
        }
    }

    pub fn filter(&self) -> &ResultQualityFilter {
        &self.filter
    }

    pub fn validator(&self) -> &AnswerValidator {
        &self.validator
    }

    pub fn refiner(&self) -> &AnswerRefiner {
        &self.refiner
    }
}

impl Default for QualityManager {
    fn default() -> Self {
        Self::new(&QualitySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_uses_settings() {
        let mut settings = QualitySettings::default();
        settings.filter.relevance_threshold = 0.9;
        settings.filter.min_keyword_overlap = 1;
        let manager = QualityManager::new(&settings);

        assert_eq!(manager.filter().config().min_keyword_overlap, 1);
        assert_eq!(manager.validator().threshold(), 0.9);
        assert_eq!(manager.refiner().config().max_answer_chars, 200);
    }

    #[test]
    fn test_custom_stop_words_reach_scorer() {
        let settings = QualitySettings {
            stop_words: StopWords::new(["서울"]),
            ..Default::default()
        };
        let manager = QualityManager::new(&settings);
        let keywords = manager.filter().scorer().extractor().extract("서울 수도");
        assert_eq!(keywords.len(), 1);
        assert!(keywords.contains("수도"));
    }
}
