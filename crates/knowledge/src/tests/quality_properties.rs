//! Property tests for the quality gates.

use crate::quality::{
    Candidate, FilterConfig, KeywordExtractor, QualityManager, QualitySettings, RankingWeights,
    StopWords,
};
use proptest::prelude::*;

const VOCAB: &[&str] = &[
    "서울", "수도", "대한민국", "한강", "인구", "세종대왕", "훈민정음", "조선", "창제", "문자",
    "부산", "항구", "도시", "은", "는", "이", "의", "그", "a", "역사",
];

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 0..12).prop_map(|words| words.join(" "))
}

fn candidate() -> impl Strategy<Value = Candidate> {
    (text(), 0.0f64..=1.0, prop::option::of(text())).prop_map(|(body, similarity, title)| {
        let candidate = Candidate::new("", body, similarity);
        match title {
            Some(title) => candidate.with_title(title),
            None => candidate,
        }
    })
}

fn candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(candidate(), 0..10).prop_map(|list| {
        list.into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.id = format!("c{}", i);
                c
            })
            .collect()
    })
}

fn manager_with_threshold(similarity_threshold: f64) -> QualityManager {
    QualityManager::new(&QualitySettings {
        filter: FilterConfig {
            similarity_threshold,
            ..Default::default()
        },
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn filter_is_deterministic(input in candidates(), query in text()) {
            let manager = QualityManager::default();
            let first = manager.filter().filter(input.clone(), &query);
            let second = manager.filter().filter(input, &query);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn filter_output_passes_every_gate(input in candidates(), query in text()) {
            let manager = QualityManager::default();
            let config = manager.filter().config().clone();
            let kept = manager.filter().filter(input.clone(), &query);

            prop_assert!(kept.len() <= input.len());
            for c in &kept {
                prop_assert!(c.similarity >= config.similarity_threshold);
                let overlap = c.keyword_overlap.unwrap();
                prop_assert!(overlap >= config.min_keyword_overlap);
                let relevance = c.relevance_score.unwrap();
                prop_assert!(relevance >= config.relevance_threshold);
                prop_assert!(relevance <= 1.0);
            }
        }

        #[test]
        fn filter_output_is_ranked(input in candidates(), query in text()) {
            let manager = QualityManager::default();
            let ranking = RankingWeights::default();
            let kept = manager.filter().filter(input, &query);

            for pair in kept.windows(2) {
                prop_assert!(ranking.combined(&pair[0]) >= ranking.combined(&pair[1]));
            }
        }

        #[test]
        fn raising_threshold_never_adds_results(
            input in candidates(),
            query in text(),
            low in 0.0f64..=1.0,
            delta in 0.0f64..=1.0,
        ) {
            let high = low + delta;
            let loose = manager_with_threshold(low).filter().filter(input.clone(), &query);
            let strict = manager_with_threshold(high).filter().filter(input, &query);

            prop_assert!(strict.len() <= loose.len());
            for c in &strict {
                prop_assert!(loose.iter().any(|l| l.id == c.id));
            }
        }

        #[test]
        fn validation_is_deterministic_and_bounded(
            question in text(),
            answer in text(),
            context in text(),
        ) {
            let manager = QualityManager::default();
            let first = manager.validator().validate(&question, &answer, &context);
            let second = manager.validator().validate(&question, &answer, &context);

            prop_assert!((0.0..=1.0).contains(&first.confidence));
            prop_assert_eq!(first.is_valid, first.confidence >= manager.validator().threshold());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn refined_answer_is_never_empty(answer in text(), context in text()) {
            let manager = QualityManager::default();
            let refined = manager
                .refiner()
                .refine(&answer, "질문", &context, manager.validator());
            prop_assert!(!refined.trim().is_empty());
        }

        #[test]
        fn extracted_keywords_are_normalized(input in "\\PC{0,40}") {
            let extractor = KeywordExtractor::new(StopWords::korean());
            for keyword in extractor.extract(&input) {
                prop_assert!(keyword.chars().count() > 1);
                prop_assert!(!extractor.stop_words().contains(&keyword));
                prop_assert!(!keyword.contains(char::is_whitespace));
            }
        }
    }

    #[test]
    fn test_empty_inputs() {
        let extractor = KeywordExtractor::new(StopWords::korean());
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   ").is_empty());

        let manager = QualityManager::default();
        assert!(manager.filter().filter(Vec::new(), "대한민국 수도").is_empty());
        assert!(!manager.validator().validate("수도", "", "서울은 수도이다").is_valid);
    }
}
