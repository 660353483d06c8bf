//! Lexical relevance between a query and a passage.

use serde::Serialize;

use super::keywords::{KeywordExtractor, KeywordFrequencies, KeywordSet};
use super::types::{Candidate, RelevanceWeights};

/// Fraction of `reference` keywords that also occur in `other`.
///
/// Asymmetric: the denominator is always `|reference|`. Returns 0.0 when
/// `reference` is empty.
pub fn keyword_overlap_ratio(reference: &KeywordSet, other: &KeywordSet) -> f64 {
    if reference.is_empty() {
        return 0.0;
    }
    reference.intersection(other).count() as f64 / reference.len() as f64
}

/// A query tokenized once and reused against many passages.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    keywords: KeywordSet,
    frequencies: KeywordFrequencies,
}

impl QueryTerms {
    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Component scores behind a relevance value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RelevanceBreakdown {
    pub keyword_overlap: f64,
    pub context_similarity: f64,
    pub title_relevance: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    extractor: KeywordExtractor,
    weights: RelevanceWeights,
}

impl RelevanceScorer {
    pub fn new(extractor: KeywordExtractor, weights: RelevanceWeights) -> Self {
        Self { extractor, weights }
    }

    pub fn extractor(&self) -> &KeywordExtractor {
        &self.extractor
    }

    pub fn weights(&self) -> &RelevanceWeights {
        &self.weights
    }

    pub fn prepare(&self, query: &str) -> QueryTerms {
        let frequencies = self.extractor.frequencies(query);
        let keywords = frequencies.keys().cloned().collect();
        QueryTerms {
            keywords,
            frequencies,
        }
    }

    /// Relevance of a passage body (and optional title) to `query`, in [0, 1].
    pub fn score(&self, query: &str, body: &str, title: Option<&str>) -> f64 {
        self.breakdown(&self.prepare(query), body, title).score
    }

    pub fn score_candidate(&self, query: &str, candidate: &Candidate) -> f64 {
        self.score(query, &candidate.body, candidate.title.as_deref())
    }

    /// Frequency-aware similarity: for every keyword shared by both texts,
    /// `min(freq) / max(freq)`, averaged over the shared keywords.
    pub fn context_similarity(&self, query: &str, text: &str) -> f64 {
        let terms = self.prepare(query);
        context_similarity(&terms.frequencies, &self.extractor.frequencies(text))
    }

    /// Overlap ratio of query keywords against title keywords, capped at 1.0.
    /// A missing or blank title scores 0.0.
    pub fn title_relevance(&self, query: &str, title: Option<&str>) -> f64 {
        self.title_relevance_for(&self.prepare(query), title)
    }

    fn title_relevance_for(&self, terms: &QueryTerms, title: Option<&str>) -> f64 {
        let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
            return 0.0;
        };
        let title_keywords = self.extractor.extract(title);
        if terms.is_empty() || title_keywords.is_empty() {
            return 0.0;
        }
        keyword_overlap_ratio(&terms.keywords, &title_keywords).min(1.0)
    }

    /// Full component breakdown for a prepared query.
    pub fn breakdown(&self, terms: &QueryTerms, body: &str, title: Option<&str>) -> RelevanceBreakdown {
        if body.is_empty() || terms.is_empty() {
            return RelevanceBreakdown::default();
        }

        let body_frequencies = self.extractor.frequencies(body);
        let body_keywords: KeywordSet = body_frequencies.keys().cloned().collect();

        let keyword_overlap = keyword_overlap_ratio(&terms.keywords, &body_keywords);
        let context_similarity = context_similarity(&terms.frequencies, &body_frequencies);
        let title_relevance = self.title_relevance_for(terms, title);

        let score = (self.weights.keyword_overlap * keyword_overlap
            + self.weights.context_similarity * context_similarity
            + self.weights.title * title_relevance)
            .min(1.0);

        RelevanceBreakdown {
            keyword_overlap,
            context_similarity,
            title_relevance,
            score,
        }
    }
}

fn context_similarity(query: &KeywordFrequencies, text: &KeywordFrequencies) -> f64 {
    if query.is_empty() || text.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut shared = 0usize;
    for (word, &query_freq) in query {
        if let Some(&text_freq) = text.get(word) {
            total += query_freq.min(text_freq) as f64 / query_freq.max(text_freq) as f64;
            shared += 1;
        }
    }

    if shared == 0 {
        0.0
    } else {
        total / shared as f64
    }
}
