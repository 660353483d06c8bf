//! QA pipeline response types.

use crate::quality::{QualityVerdict, SearchQuality};
use serde::{Deserialize, Serialize};

/// Answer text when the retriever returned nothing.
pub const NO_DOCUMENTS_MESSAGE: &str = "관련 문서를 찾을 수 없습니다.";

/// Answer text when every candidate was rejected by the quality filter.
pub const NO_RELEVANT_DOCUMENTS_MESSAGE: &str = "관련성이 높은 문서를 찾을 수 없습니다.";

/// How a question was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// A validated answer backed by the top document.
    Answered,
    /// The retriever returned no candidates.
    NoDocuments,
    /// Candidates were found but none survived the quality filter.
    NoRelevantDocuments,
    /// The draft answer failed validation or was replaced by the refiner.
    InvalidAnswer,
}

impl AnswerOutcome {
    pub fn is_no_evidence(&self) -> bool {
        matches!(
            self,
            AnswerOutcome::NoDocuments | AnswerOutcome::NoRelevantDocuments
        )
    }
}

/// Quality information attached to an answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub confidence: f64,
    /// True only when the returned answer is the model's own, i.e. it passed
    /// both the validator and the refiner's context-support gate.
    pub is_valid: bool,
    /// Validator verdict on the draft against question and context.
    pub verdict: QualityVerdict,
    pub search_quality: SearchQuality,
}

/// Result of [`QaPipeline::answer`](super::QaPipeline::answer), serialized
/// with KorQuAD-style field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    #[serde(rename = "retrieved_document_id")]
    pub document_id: String,

    #[serde(rename = "retrieved_document")]
    pub document_text: String,

    pub question: String,

    #[serde(rename = "answers")]
    pub answer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityReport>,

    pub outcome: AnswerOutcome,
}

impl QaResponse {
    /// A well-formed "no evidence" result with an empty document.
    pub fn no_evidence(question: &str, outcome: AnswerOutcome) -> Self {
        let answer = match outcome {
            AnswerOutcome::NoRelevantDocuments => NO_RELEVANT_DOCUMENTS_MESSAGE,
            _ => NO_DOCUMENTS_MESSAGE,
        };

        Self {
            document_id: String::new(),
            document_text: String::new(),
            question: question.to_string(),
            answer: answer.to_string(),
            quality_metrics: None,
            outcome,
        }
    }
}
