//! Keyword extraction.
//!
//! Text is lower-cased, every character that is not a word character becomes a
//! space, and the remaining whitespace-separated tokens are kept when they are
//! longer than one character and not in the stop-word list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Deduplicated, normalized keywords of a text.
pub type KeywordSet = HashSet<String>;

/// Token frequencies of a text, keyed by normalized keyword.
///
/// Ordered so that floating-point sums over it are reproducible.
pub type KeywordFrequencies = BTreeMap<String, usize>;

/// Korean particles, demonstratives and copulas that carry no topical signal.
pub const KOREAN_STOP_WORDS: &[&str] = &[
    "이", "가", "을", "를", "에", "의", "와", "과", "은", "는", "도", "로", "으로", "에서", "에게",
    "한테", "부터", "까지", "처럼", "같이", "만", "조차", "마저", "그", "저", "그것", "이것",
    "저것", "그런", "이런", "저런", "하다", "되다", "있다", "없다", "같다", "이다", "아니다",
];

/// A configurable stop-word list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopWords(BTreeSet<String>);

impl StopWords {
    /// Build a list from arbitrary words. Words are lower-cased so they match
    /// normalized tokens.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(words.into_iter().map(|w| w.into().to_lowercase()).collect())
    }

    /// The default Korean list.
    pub fn korean() -> Self {
        Self::new(KOREAN_STOP_WORDS.iter().copied())
    }

    /// An empty list.
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::korean()
    }
}

/// Extracts keyword sets and keyword frequencies from text.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    stop_words: StopWords,
}

impl KeywordExtractor {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Normalized keyword tokens in text order, repeats included.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        normalize(text)
            .split_whitespace()
            .filter(|token| token.chars().count() > 1 && !self.stop_words.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Keyword set of `text`. Empty input yields an empty set.
    pub fn extract(&self, text: &str) -> KeywordSet {
        self.tokens(text).into_iter().collect()
    }

    /// How often each keyword occurs in `text`.
    pub fn frequencies(&self, text: &str) -> KeywordFrequencies {
        let mut freq = KeywordFrequencies::new();
        for token in self.tokens(text) {
            *freq.entry(token).or_insert(0) += 1;
        }
        freq
    }
}

/// Lower-case `text` and replace every non-word character with a space.
///
/// Word characters are Unicode letters and digits plus `_`, so Hangul and
/// Latin text survive while punctuation and symbols act as separators.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if is_word_char(c) || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> KeywordSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_empty_text_has_no_keywords() {
        let extractor = KeywordExtractor::default();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   \n\t").is_empty());
        assert!(extractor.frequencies("").is_empty());
    }

    #[test]
    fn test_punctuation_becomes_separator() {
        let extractor = KeywordExtractor::default();
        let keywords = extractor.extract("서울은 대한민국의 수도이다. (인구: 약 940만)");
        assert_eq!(
            keywords,
            set(&["서울은", "대한민국의", "수도이다", "인구", "940만"])
        );
    }

    #[test]
    fn test_lowercase_and_dedup() {
        let extractor = KeywordExtractor::new(StopWords::none());
        let keywords = extractor.extract("Hello, World! hello HELLO");
        assert_eq!(keywords, set(&["hello", "world"]));
    }

    #[test]
    fn test_single_character_tokens_dropped() {
        let extractor = KeywordExtractor::new(StopWords::none());
        assert_eq!(extractor.extract("a b cd 집 집들"), set(&["cd", "집들"]));
    }

    #[test]
    fn test_stop_words_dropped() {
        let extractor = KeywordExtractor::default();
        let keywords = extractor.extract("그것 이것 책은 있다 도시에 아니다");
        assert_eq!(keywords, set(&["책은", "도시에"]));
    }

    #[test]
    fn test_custom_stop_words_are_lowercased() {
        let extractor = KeywordExtractor::new(StopWords::new(["The", "AND"]));
        assert_eq!(extractor.extract("the cat and THE dog"), set(&["cat", "dog"]));
    }

    #[test]
    fn test_underscore_is_word_character() {
        let extractor = KeywordExtractor::new(StopWords::none());
        assert_eq!(extractor.extract("snake_case-name"), set(&["snake_case", "name"]));
    }

    #[test]
    fn test_frequencies_count_repeats() {
        let extractor = KeywordExtractor::default();
        let freq = extractor.frequencies("서울 서울 부산, 서울");
        assert_eq!(freq.get("서울"), Some(&3));
        assert_eq!(freq.get("부산"), Some(&1));
        assert_eq!(freq.len(), 2);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = KeywordExtractor::default();
        let text = "세종대왕은 조선의 제4대 왕으로 훈민정음을 창제하였다.";
        assert_eq!(extractor.extract(text), extractor.extract(text));
        assert_eq!(extractor.tokens(text), extractor.tokens(text));
    }

    #[test]
    fn test_default_is_korean_list() {
        let stop_words = StopWords::default();
        assert_eq!(stop_words.len(), KOREAN_STOP_WORDS.len());
        assert!(stop_words.contains("에서"));
        assert!(!stop_words.contains("서울"));
    }
}
