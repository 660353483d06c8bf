//! Character n-gram embedding provider.

use crate::embeddings::provider::EmbeddingProvider;
use crate::quality::keywords::normalize;
use korqa_core::AppResult;
use std::collections::BTreeMap;

/// Offline provider that hashes character bigrams, trigrams and whole words
/// into a fixed number of dimensions.
///
/// Korean words carry particles (`수도는`, `수도의`), so bigrams are what let
/// inflected forms land near each other. Deterministic for identical input;
/// empty text yields the zero vector.
#[derive(Debug)]
pub struct NgramProvider {
    dimensions: usize,
}

impl NgramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        let normalized = normalize(text);
        for word in normalized
            .split_whitespace()
            .filter(|w| w.chars().count() > 1)
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            let weight = (*freq as f32).sqrt();

            for n in [2usize, 3] {
                for window in chars.windows(n) {
                    let gram: String = window.iter().collect();
                    embedding[self.bucket(&gram, 37)] += weight;
                }
            }

            embedding[self.bucket(word, 31)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }

    fn bucket(&self, token: &str, multiplier: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash as usize) % self.dimensions
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for NgramProvider {
    fn provider_name(&self) -> &str {
        "ngram"
    }

    fn model_name(&self) -> &str {
        "char-ngram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.generate_embedding(text)).collect())
    }
}
