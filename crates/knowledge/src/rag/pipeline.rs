//! Question answering over retrieved passages with quality gates.

use crate::generator::AnswerGenerator;
use crate::quality::{Candidate, QualityManager};
use crate::rag::context::build_context;
use crate::rag::types::{AnswerOutcome, QaResponse, QualityReport};
use crate::retriever::Retriever;
use korqa_core::AppResult;
use std::sync::Arc;

/// Default number of raw candidates requested per returned passage.
pub const DEFAULT_RETRIEVAL_MULTIPLIER: usize = 2;

/// Retrieve, filter, generate, validate, refine.
///
/// All configuration is fixed at construction; the pipeline holds no
/// per-request state and can be shared across tasks.
#[derive(Clone)]
pub struct QaPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    quality: QualityManager,
    retrieval_multiplier: usize,
}

impl QaPipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
        quality: QualityManager,
    ) -> Self {
        Self {
            retriever,
            generator,
            quality,
            retrieval_multiplier: DEFAULT_RETRIEVAL_MULTIPLIER,
        }
    }

    pub fn with_retrieval_multiplier(mut self, multiplier: usize) -> Self {
        self.retrieval_multiplier = multiplier.max(1);
        self
    }

    pub fn quality(&self) -> &QualityManager {
        &self.quality
    }

    /// Answer `question` from at most `top_k` trusted passages.
    ///
    /// Weak evidence and rejected answers come back as data; only retriever
    /// or generator failures are returned as errors.
    pub async fn answer(&self, question: &str, top_k: usize) -> AppResult<QaResponse> {
        let top_k = top_k.max(1);
        let limit = top_k.saturating_mul(self.retrieval_multiplier);

        let raw = self.retriever.search(question, limit).await?;
        if raw.is_empty() {
            tracing::info!("No documents retrieved");
            return Ok(QaResponse::no_evidence(question, AnswerOutcome::NoDocuments));
        }

        let raw_count = raw.len();
        let mut trusted = self.quality.filter().filter(raw, question);
        if trusted.is_empty() {
            tracing::info!(raw_count, "All retrieved documents rejected by quality filter");
            return Ok(QaResponse::no_evidence(
                question,
                AnswerOutcome::NoRelevantDocuments,
            ));
        }
        trusted.truncate(top_k);

        tracing::info!(
            raw_count,
            trusted = trusted.len(),
            top_similarity = trusted[0].similarity,
            "Selected passages"
        );

        let context = build_context(&trusted);
        let draft = self.generator.generate(question, &context).await?;

        let verdict = self.quality.validator().validate(question, &draft, &context);

        let top = &trusted[0];
        let refined = self.quality.refiner().refine_detailed(
            &draft,
            question,
            &top.body,
            self.quality.validator(),
        );

        let outcome = if verdict.is_valid && !refined.is_replaced() {
            AnswerOutcome::Answered
        } else {
            AnswerOutcome::InvalidAnswer
        };

        tracing::info!(
            confidence = verdict.confidence,
            is_valid = verdict.is_valid,
            refine = ?refined.status,
            ?outcome,
            "Answer ready"
        );

        let search_quality = self.quality.filter().quality_metrics(&trusted);

        Ok(QaResponse {
            document_id: document_id(top),
            document_text: top.body.clone(),
            question: question.to_string(),
            answer: refined.text,
            quality_metrics: Some(QualityReport {
                confidence: verdict.confidence,
                is_valid: outcome == AnswerOutcome::Answered,
                verdict,
                search_quality,
            }),
            outcome,
        })
    }
}

/// Passage chunks report the id of the paragraph they came from.
fn document_id(candidate: &Candidate) -> String {
    candidate
        .metadata_str("original_id")
        .unwrap_or(&candidate.id)
        .to_string()
}
