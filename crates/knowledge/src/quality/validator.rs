//! Answer validation against the question and the supporting context.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::relevance::{keyword_overlap_ratio, RelevanceScorer};
use super::types::ConfidenceWeights;

/// Answers shorter than this (in characters, after trimming) are rejected.
pub const MIN_ANSWER_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    MissingInput,
    TooShort,
    NotRelevant,
    Valid,
}

impl VerdictReason {
    pub fn message(&self) -> &'static str {
        match self {
            VerdictReason::MissingInput => "답변 또는 컨텍스트가 없습니다.",
            VerdictReason::TooShort => "답변이 너무 짧습니다.",
            VerdictReason::NotRelevant => "답변이 컨텍스트와 관련이 없습니다.",
            VerdictReason::Valid => "답변이 유효합니다.",
        }
    }
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub is_valid: bool,
    pub confidence: f64,
    pub context_relevance: f64,
    pub answer_context_match: f64,
    pub qa_relevance: f64,
    pub reason: VerdictReason,
    pub message: String,
}

impl QualityVerdict {
    fn rejected(reason: VerdictReason) -> Self {
        Self {
            is_valid: false,
            confidence: 0.0,
            context_relevance: 0.0,
            answer_context_match: 0.0,
            qa_relevance: 0.0,
            reason,
            message: reason.message().to_string(),
        }
    }
}

/// Scores a generated answer and decides whether it is grounded.
///
/// `confidence = w.context_relevance * relevance(question, context)
///             + w.answer_context_match * |A ∩ C| / |A|
///             + w.qa_relevance * |Q ∩ A| / |Q|`
///
/// The answer is valid when confidence reaches the relevance threshold.
#[derive(Debug, Clone)]
pub struct AnswerValidator {
    scorer: RelevanceScorer,
    threshold: f64,
    weights: ConfidenceWeights,
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::new(RelevanceScorer::default(), 0.3, ConfidenceWeights::default())
    }
}

impl AnswerValidator {
    pub fn new(scorer: RelevanceScorer, threshold: f64, weights: ConfidenceWeights) -> Self {
        Self {
            scorer,
            threshold,
            weights,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn validate(&self, question: &str, answer: &str, context: &str) -> QualityVerdict {
        if answer.trim().is_empty() || context.trim().is_empty() {
            return QualityVerdict::rejected(VerdictReason::MissingInput);
        }
        if answer.trim().chars().count() < MIN_ANSWER_CHARS {
            return QualityVerdict::rejected(VerdictReason::TooShort);
        }

        let extractor = self.scorer.extractor();
        let question_keywords = extractor.extract(question);
        let answer_keywords = extractor.extract(answer);
        let context_keywords = extractor.extract(context);

        let context_relevance = self.scorer.score(question, context, None);
        let answer_context_match = keyword_overlap_ratio(&answer_keywords, &context_keywords);
        let qa_relevance = keyword_overlap_ratio(&question_keywords, &answer_keywords);

        let confidence = (self.weights.context_relevance * context_relevance
            + self.weights.answer_context_match * answer_context_match
            + self.weights.qa_relevance * qa_relevance)
            .clamp(0.0, 1.0);

        let is_valid = confidence >= self.threshold;
        let reason = if is_valid {
            VerdictReason::Valid
        } else {
            VerdictReason::NotRelevant
        };

        tracing::debug!(
            confidence,
            context_relevance,
            answer_context_match,
            qa_relevance,
            is_valid,
            "Validated answer"
        );

        QualityVerdict {
            is_valid,
            confidence,
            context_relevance,
            answer_context_match,
            qa_relevance,
            reason,
            message: reason.message().to_string(),
        }
    }
}
