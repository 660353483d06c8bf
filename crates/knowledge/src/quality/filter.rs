//! Candidate filtering, re-ranking and search quality metrics.

use serde::{Deserialize, Serialize};

use super::relevance::RelevanceScorer;
use super::types::{Candidate, FilterConfig, RankingWeights};

/// Marker message reported when there is nothing to measure.
pub const NO_RESULTS_MESSAGE: &str = "검색 결과가 없습니다.";

/// Summary statistics over a filtered result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub total_results: usize,
    pub avg_similarity_score: f64,
    pub avg_relevance_score: f64,
    pub min_similarity_score: f64,
    pub max_similarity_score: f64,
    pub high_quality_results: usize,
    pub quality_ratio: f64,
}

/// Search quality of a result set, or an explicit marker when the set is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchQuality {
    Measured(QualityMetrics),
    NoResults { error: String },
}

impl SearchQuality {
    pub fn no_results() -> Self {
        SearchQuality::NoResults {
            error: NO_RESULTS_MESSAGE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SearchQuality::NoResults { .. })
    }

    pub fn metrics(&self) -> Option<&QualityMetrics> {
        match self {
            SearchQuality::Measured(metrics) => Some(metrics),
            SearchQuality::NoResults { .. } => None,
        }
    }
}

/// Drops weak candidates and re-orders the survivors.
///
/// Gates run in order: similarity threshold, minimum keyword overlap with the
/// query, relevance threshold. Survivors are annotated with their relevance
/// score and overlap count, then stably sorted by
/// `ranking.similarity * similarity + ranking.relevance * relevance`,
/// descending.
#[derive(Debug, Clone, Default)]
pub struct ResultQualityFilter {
    config: FilterConfig,
    scorer: RelevanceScorer,
    ranking: RankingWeights,
}

impl ResultQualityFilter {
    pub fn new(config: FilterConfig, scorer: RelevanceScorer, ranking: RankingWeights) -> Self {
        Self {
            config,
            scorer,
            ranking,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn filter(&self, candidates: Vec<Candidate>, query: &str) -> Vec<Candidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let total = candidates.len();
        let terms = self.scorer.prepare(query);
        let mut kept = Vec::with_capacity(total);

        for mut candidate in candidates {
            // Written this way round so that NaN similarity is rejected.
            if !(candidate.similarity >= self.config.similarity_threshold) {
                tracing::debug!(id = %candidate.id, similarity = candidate.similarity, "Rejected by similarity");
                continue;
            }

            let body_keywords = self.scorer.extractor().extract(&candidate.body);
            let overlap = terms.keywords().intersection(&body_keywords).count();
            if overlap < self.config.min_keyword_overlap {
                tracing::debug!(id = %candidate.id, overlap, "Rejected by keyword overlap");
                continue;
            }

            let relevance = self
                .scorer
                .breakdown(&terms, &candidate.body, candidate.title.as_deref())
                .score;
            if relevance < self.config.relevance_threshold {
                tracing::debug!(id = %candidate.id, relevance, "Rejected by relevance");
                continue;
            }

            candidate.relevance_score = Some(relevance);
            candidate.keyword_overlap = Some(overlap);
            kept.push(candidate);
        }

        // sort_by is stable, ties keep retrieval order.
        kept.sort_by(|a, b| self.ranking.combined(b).total_cmp(&self.ranking.combined(a)));

        tracing::debug!(total, kept = kept.len(), "Filtered search results");
        kept
    }

    /// Metrics over an already-filtered result set.
    pub fn quality_metrics(&self, results: &[Candidate]) -> SearchQuality {
        if results.is_empty() {
            return SearchQuality::no_results();
        }

        let n = results.len() as f64;
        let similarities = results.iter().map(|c| c.similarity);
        let relevances = results.iter().map(|c| c.relevance_score.unwrap_or(0.0));

        let high_quality_results = results
            .iter()
            .filter(|c| c.similarity >= self.config.similarity_threshold)
            .count();

        SearchQuality::Measured(QualityMetrics {
            total_results: results.len(),
            avg_similarity_score: similarities.clone().sum::<f64>() / n,
            avg_relevance_score: relevances.sum::<f64>() / n,
            min_similarity_score: similarities.clone().fold(f64::INFINITY, f64::min),
            max_similarity_score: similarities.fold(f64::NEG_INFINITY, f64::max),
            high_quality_results,
            quality_ratio: high_quality_results as f64 / n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_input_returns_empty() {
        let filter = ResultQualityFilter::default();
        assert!(filter.filter(Vec::new(), "대한민국 수도").is_empty());
    }

    #[test]
    fn test_similarity_gate() {
        let filter = ResultQualityFilter::default();
        let candidates = vec![
            Candidate::new("low", "대한민국 수도 서울", 0.59),
            Candidate::new("nan", "대한민국 수도 서울", f64::NAN),
            Candidate::new("ok", "대한민국 수도 서울", 0.6),
        ];
        let kept = filter.filter(candidates, "대한민국 수도 서울");
        let ids: Vec<_> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[test]
    fn test_keyword_overlap_gate() {
        let filter = ResultQualityFilter::default();
        let candidates = vec![
            Candidate::new("one", "서울 인구 통계", 0.9),
            Candidate::new("two", "서울 수도 통계", 0.9),
        ];
        let kept = filter.filter(candidates, "서울 수도");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "two");
        assert_eq!(kept[0].keyword_overlap, Some(2));
    }

    #[test]
    fn test_single_keyword_query_never_passes_default_overlap() {
        let filter = ResultQualityFilter::default();
        let candidates = vec![Candidate::new("a", "수도 수도 수도", 0.99)];
        assert!(filter.filter(candidates, "수도").is_empty());
    }

    #[test]
    fn test_relevance_gate() {
        let config = FilterConfig {
            similarity_threshold: 0.0,
            relevance_threshold: 0.5,
            min_keyword_overlap: 0,
        };
        let filter = ResultQualityFilter::new(config, RelevanceScorer::default(), RankingWeights::default());
        // Two of six query keywords: overlap 1/3, context similarity 1.0.
        // 0.4/3 + 0.4 = 0.533 passes. One keyword of six scores 0.466.
        let candidates = vec![
            Candidate::new("weak", "서울 부산", 0.9),
            Candidate::new("strong", "서울 수도", 0.9),
        ];
        let kept = filter.filter(candidates, "서울 수도 인구 면적 역사 문화");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "strong");
        assert!(approx(kept[0].relevance_score.unwrap(), 0.4 / 3.0 + 0.4));
    }

    #[test]
    fn test_sorted_by_combined_score() {
        let filter = ResultQualityFilter::default();
        let candidates = vec![
            Candidate::new("lower", "대한민국 수도 서울", 0.65),
            Candidate::new("higher", "대한민국 수도 서울", 0.9),
        ];
        let kept = filter.filter(candidates, "대한민국 수도 서울");
        assert_eq!(kept[0].id, "higher");
        assert_eq!(kept[1].id, "lower");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let filter = ResultQualityFilter::default();
        let candidates = vec![
            Candidate::new("first", "대한민국 수도 서울", 0.75),
            Candidate::new("second", "대한민국 수도 서울", 0.75),
            Candidate::new("third", "대한민국 수도 서울", 0.75),
        ];
        let kept = filter.filter(candidates, "대한민국 수도 서울");
        let ids: Vec<_> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_metrics_no_results_marker() {
        let filter = ResultQualityFilter::default();
        let quality = filter.quality_metrics(&[]);
        assert!(quality.is_empty());
        let json = serde_json::to_value(&quality).unwrap();
        assert_eq!(json["error"], NO_RESULTS_MESSAGE);
    }

    #[test]
    fn test_metrics_values() {
        let filter = ResultQualityFilter::default();
        let mut a = Candidate::new("a", "x", 0.8);
        a.relevance_score = Some(0.6);
        let mut b = Candidate::new("b", "y", 0.2);
        b.relevance_score = Some(0.4);

        let quality = filter.quality_metrics(&[a, b]);
        let metrics = quality.metrics().unwrap();
        assert_eq!(metrics.total_results, 2);
        assert!(approx(metrics.avg_similarity_score, 0.5));
        assert!(approx(metrics.avg_relevance_score, 0.5));
        assert!(approx(metrics.min_similarity_score, 0.2));
        assert!(approx(metrics.max_similarity_score, 0.8));
        assert_eq!(metrics.high_quality_results, 1);
        assert!(approx(metrics.quality_ratio, 0.5));
    }
}
