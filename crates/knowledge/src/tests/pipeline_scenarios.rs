//! End-to-end behavior of the question answering pipeline.

use crate::embeddings::providers::NgramProvider;
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use crate::generator::AnswerGenerator;
use crate::index::PassageIndex;
use crate::loader::DataLoader;
use crate::quality::{
    Candidate, FilterConfig, Metadata, QualityManager, QualitySettings, SearchQuality,
    EMPTY_ANSWER_MESSAGE, NO_RESULTS_MESSAGE, UNSUPPORTED_ANSWER_MESSAGE,
};
use crate::rag::{
    AnswerOutcome, QaPipeline, NO_DOCUMENTS_MESSAGE, NO_RELEVANT_DOCUMENTS_MESSAGE,
};
use crate::retriever::{IndexRetriever, Retriever};
use crate::types::KnowledgeBaseConfig;
use async_trait::async_trait;
use korqa_core::{AppError, AppResult};
use std::sync::{Arc, Mutex};

struct FixedRetriever {
    candidates: Vec<Candidate>,
    limits: Mutex<Vec<usize>>,
}

impl FixedRetriever {
    fn new(candidates: Vec<Candidate>) -> Arc<Self> {
        Arc::new(Self {
            candidates,
            limits: Mutex::new(Vec::new()),
        })
    }

    fn limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn search(&self, _query: &str, limit: usize) -> AppResult<Vec<Candidate>> {
        self.limits.lock().unwrap().push(limit);
        Ok(self.candidates.iter().take(limit).cloned().collect())
    }
}

struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn search(&self, _query: &str, _limit: usize) -> AppResult<Vec<Candidate>> {
        Err(AppError::Retrieval("index unavailable".to_string()))
    }
}

struct FixedGenerator {
    answer: String,
    contexts: Mutex<Vec<String>>,
}

impl FixedGenerator {
    fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            contexts: Mutex::new(Vec::new()),
        })
    }

    fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for FixedGenerator {
    async fn generate(&self, _question: &str, context: &str) -> AppResult<String> {
        self.contexts.lock().unwrap().push(context.to_string());
        Ok(self.answer.clone())
    }
}

struct FailingGenerator;

#[async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn generate(&self, _question: &str, _context: &str) -> AppResult<String> {
        Err(AppError::Llm("model not loaded".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTION: &str = "대한민국 수도 서울";

    fn seoul_candidates() -> Vec<Candidate> {
        let mut metadata = Metadata::new();
        metadata.insert("original_id".to_string(), serde_json::json!("6566495-0-0"));

        vec![
            Candidate::new("pasta", "파스타 요리법", 0.9),
            Candidate::new("6566495-0-0#0", "대한민국 수도 서울 한강 유역 위치", 0.85)
                .with_title("서울특별시")
                .with_metadata(metadata),
            Candidate::new("p2", "대한민국 수도 서울 인구 천만", 0.7),
            Candidate::new("weak", "대한민국 수도 서울 인구", 0.4),
        ]
    }

    fn pipeline(retriever: Arc<dyn Retriever>, generator: Arc<dyn AnswerGenerator>) -> QaPipeline {
        QaPipeline::new(retriever, generator, QualityManager::default())
    }

    #[tokio::test]
    async fn test_answered_from_trusted_passages() {
        let retriever = FixedRetriever::new(seoul_candidates());
        let generator = FixedGenerator::new("대한민국 수도 서울");
        let pipeline = pipeline(retriever.clone(), generator.clone());

        let response = pipeline.answer(QUESTION, 2).await.unwrap();

        assert_eq!(response.outcome, AnswerOutcome::Answered);
        assert_eq!(response.answer, "대한민국 수도 서울");
        assert_eq!(response.document_id, "6566495-0-0");
        assert_eq!(response.document_text, "대한민국 수도 서울 한강 유역 위치");
        assert_eq!(retriever.limits(), vec![4]);

        let contexts = generator.contexts();
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].starts_with("[위키피디아 문서 1] 제목: 서울특별시 | 유사도: 0.850\n"));
        assert!(contexts[0].contains("[위키피디아 문서 2] 제목: 문서 2 | 유사도: 0.700\n"));
        assert!(!contexts[0].contains("파스타"));

        let report = response.quality_metrics.unwrap();
        assert!(report.is_valid);
        assert!(report.confidence >= 0.3);
        assert_eq!(report.search_quality.metrics().unwrap().total_results, 2);
    }

    #[tokio::test]
    async fn test_top_k_truncates_after_filtering() {
        let retriever = FixedRetriever::new(seoul_candidates());
        let generator = FixedGenerator::new("대한민국 수도 서울");
        let pipeline = pipeline(retriever.clone(), generator.clone());

        let response = pipeline.answer(QUESTION, 1).await.unwrap();

        assert_eq!(retriever.limits(), vec![2]);
        assert!(!generator.contexts()[0].contains("[위키피디아 문서 2]"));
        let report = response.quality_metrics.unwrap();
        assert_eq!(report.search_quality.metrics().unwrap().total_results, 1);
    }

    #[tokio::test]
    async fn test_custom_retrieval_multiplier() {
        let retriever = FixedRetriever::new(seoul_candidates());
        let pipeline = pipeline(retriever.clone(), FixedGenerator::new("대한민국 수도 서울"))
            .with_retrieval_multiplier(3);

        pipeline.answer(QUESTION, 2).await.unwrap();
        assert_eq!(retriever.limits(), vec![6]);
    }

    #[tokio::test]
    async fn test_no_documents() {
        let generator = FixedGenerator::new("아무 답변");
        let pipeline = pipeline(FixedRetriever::new(Vec::new()), generator.clone());

        let response = pipeline.answer(QUESTION, 5).await.unwrap();

        assert_eq!(response.outcome, AnswerOutcome::NoDocuments);
        assert_eq!(response.answer, NO_DOCUMENTS_MESSAGE);
        assert!(response.document_id.is_empty());
        assert!(response.document_text.is_empty());
        assert!(response.quality_metrics.is_none());
        assert!(generator.contexts().is_empty());
    }

    #[tokio::test]
    async fn test_no_relevant_documents() {
        let retriever = FixedRetriever::new(vec![
            Candidate::new("pasta", "파스타 요리법", 0.95),
            Candidate::new("weak", "대한민국 수도 서울", 0.3),
        ]);
        let generator = FixedGenerator::new("아무 답변");
        let pipeline = pipeline(retriever, generator.clone());

        let response = pipeline.answer(QUESTION, 5).await.unwrap();

        assert_eq!(response.outcome, AnswerOutcome::NoRelevantDocuments);
        assert_eq!(response.answer, NO_RELEVANT_DOCUMENTS_MESSAGE);
        assert!(response.outcome.is_no_evidence());
        assert!(generator.contexts().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_answer_is_replaced() {
        let retriever = FixedRetriever::new(seoul_candidates());
        let pipeline = pipeline(retriever, FixedGenerator::new("파스타 요리법 설명 드립니다"));

        let response = pipeline.answer(QUESTION, 1).await.unwrap();

        assert_eq!(response.outcome, AnswerOutcome::InvalidAnswer);
        assert_eq!(response.answer, UNSUPPORTED_ANSWER_MESSAGE);
        assert_eq!(response.document_id, "6566495-0-0");
        assert!(!response.quality_metrics.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_answer_rejected_by_refiner_is_not_valid() {
        let retriever = FixedRetriever::new(vec![Candidate::new(
            "c1",
            "대한민국 수도 서울 한강",
            0.8,
        )]);
        let pipeline = pipeline(retriever, FixedGenerator::new("대한민국 수도 서울특별시"));

        let response = pipeline.answer(QUESTION, 1).await.unwrap();

        assert_eq!(response.outcome, AnswerOutcome::InvalidAnswer);
        assert_eq!(response.answer, UNSUPPORTED_ANSWER_MESSAGE);
        let report = response.quality_metrics.unwrap();
        // The draft itself looks relevant; only the context-support gate fails.
        assert!(report.verdict.is_valid);
        assert!(!report.is_valid);
    }

    #[tokio::test]
    async fn test_huge_top_k_does_not_overflow() {
        let retriever = FixedRetriever::new(seoul_candidates());
        let pipeline = pipeline(retriever.clone(), FixedGenerator::new("대한민국 수도 서울"));

        let response = pipeline.answer(QUESTION, usize::MAX).await.unwrap();

        assert_eq!(retriever.limits(), vec![usize::MAX]);
        assert_eq!(response.outcome, AnswerOutcome::Answered);
        let report = response.quality_metrics.unwrap();
        assert_eq!(report.search_quality.metrics().unwrap().total_results, 2);
    }

    #[tokio::test]
    async fn test_empty_generation() {
        let retriever = FixedRetriever::new(seoul_candidates());
        let pipeline = pipeline(retriever, FixedGenerator::new("   "));

        let response = pipeline.answer(QUESTION, 1).await.unwrap();

        assert_eq!(response.outcome, AnswerOutcome::InvalidAnswer);
        assert_eq!(response.answer, EMPTY_ANSWER_MESSAGE);
        assert!(!response.quality_metrics.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_retriever_failure_propagates() {
        let pipeline = pipeline(Arc::new(FailingRetriever), FixedGenerator::new("답변"));

        let err = pipeline.answer(QUESTION, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
        assert!(err.is_dependency_failure());
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let retriever = FixedRetriever::new(seoul_candidates());
        let pipeline = pipeline(retriever, Arc::new(FailingGenerator));

        let err = pipeline.answer(QUESTION, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert!(err.is_dependency_failure());
    }

    #[test]
    fn test_single_keyword_query_is_rejected() {
        let manager = QualityManager::default();
        let candidates = vec![Candidate::new("c1", "서울은 대한민국 수도 이다", 0.8)];

        let kept = manager.filter().filter(candidates, "수도");
        assert!(kept.is_empty());
    }

    #[test]
    fn test_short_answer_verdict() {
        let manager = QualityManager::default();
        let verdict = manager.validator().validate("", "짧음", "아무 컨텍스트");

        assert!(!verdict.is_valid);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.message, "답변이 너무 짧습니다.");
    }

    #[test]
    fn test_long_answer_cut_at_first_sentence() {
        let manager = QualityManager::default();
        let first = "세종대왕은 집현전 학자들과 함께 훈민정음을 창제하여 반포하였다 조선의 왕";
        assert_eq!(first.chars().count(), 40);

        let answer = format!("{}.{}", first, "가".repeat(209));
        assert_eq!(answer.chars().count(), 250);

        let context = "세종대왕은 집현전 학자들과 함께 훈민정음을 창제하여 반포하였다. 조선의 왕이다.";
        let refined = manager
            .refiner()
            .refine(&answer, "훈민정음", context, manager.validator());

        assert_eq!(refined, format!("{}.", first));
        assert!(refined.chars().count() <= 41);
    }

    #[test]
    fn test_all_below_threshold_yields_no_results() {
        let manager = QualityManager::default();
        let candidates: Vec<Candidate> = [0.1, 0.2, 0.3, 0.4, 0.5]
            .iter()
            .enumerate()
            .map(|(i, &sim)| Candidate::new(format!("c{}", i), "대한민국 수도 서울", sim))
            .collect();

        let kept = manager.filter().filter(candidates, QUESTION);
        assert!(kept.is_empty());

        let quality = manager.filter().quality_metrics(&kept);
        assert!(quality.is_empty());
        assert_eq!(
            serde_json::to_value(&quality).unwrap(),
            serde_json::json!({ "error": NO_RESULTS_MESSAGE })
        );
        assert!(matches!(quality, SearchQuality::NoResults { .. }));
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let manager = QualityManager::default();
        let a = Candidate::new("a", "대한민국 수도 서울", 0.75);
        let b = Candidate::new("b", "대한민국 수도 서울", 0.75);

        let kept = manager.filter().filter(vec![a.clone(), b.clone()], QUESTION);
        let ids: Vec<_> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let kept = manager.filter().filter(vec![b, a], QUESTION);
        let ids: Vec<_> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_loaded_corpus_answers_question() {
        let corpus = r#"{
            "version": "KorQuAD_v1.0_dev",
            "data": [
                {"title": "서울특별시", "paragraphs": [
                    {"context": "서울특별시는 대한민국의 수도이자 최대 도시이다.", "qas": [{"id": "s-0-0"}]}
                ]},
                {"title": "세종", "paragraphs": [
                    {"context": "세종대왕은 조선의 제4대 왕으로 훈민정음을 창제하였다.", "qas": [{"id": "k-0-0"}]}
                ]}
            ]
        }"#;
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("dev.json");
        std::fs::write(&path, corpus).unwrap();

        let config = KnowledgeBaseConfig {
            name: "korquad".to_string(),
            embedding: EmbeddingConfig {
                dimensions: 128,
                ..Default::default()
            },
            quality: QualitySettings {
                filter: FilterConfig {
                    similarity_threshold: 0.0,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(NgramProvider::new(128));
        let index = Arc::new(PassageIndex::open_in_memory().unwrap());
        let loader = DataLoader::new(index.clone(), embedder.clone(), config.clone());
        assert!(loader.initialize(Some(&path), false).await.unwrap());

        let pipeline = QaPipeline::new(
            Arc::new(IndexRetriever::new(embedder, index)),
            FixedGenerator::new("세종대왕은 훈민정음을 창제하였다"),
            QualityManager::new(&config.quality),
        );

        let response = pipeline
            .answer("훈민정음을 창제한 조선의 왕은 누구인가", 3)
            .await
            .unwrap();

        assert_eq!(response.outcome, AnswerOutcome::Answered);
        assert_eq!(response.document_id, "k-0-0");
        assert_eq!(response.answer, "세종대왕은 훈민정음을 창제하였다");
    }
}
