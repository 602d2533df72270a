//! Deterministic offline embeddings from hashed character trigrams.

use super::EmbeddingProvider;
use lexrag_core::AppResult;
use std::collections::HashMap;

/// Default vector width.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Hashing embedder for offline indexing and tests.
///
/// Vectors are content-dependent and unit length but carry no semantics
/// beyond shared words and trigrams.
#[derive(Debug)]
pub struct HashingEmbeddings {
    dimensions: usize,
}

impl HashingEmbeddings {
    /// Create a provider producing `dimensions`-wide vectors.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Vector width.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2)
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let slot = bucket(window.iter().collect::<String>().as_bytes(), 37, self.dimensions);
                embedding[slot] += (*freq as f32).sqrt();
            }

            let slot = bucket(word.as_bytes(), 31, self.dimensions);
            embedding[slot] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

fn bucket(bytes: &[u8], multiplier: u64, dimensions: usize) -> usize {
    let hash = bytes
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
    (hash % dimensions as u64) as usize
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashingEmbeddings {
    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        "trigram-hash-v1"
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let provider = HashingEmbeddings::new(DEFAULT_DIMENSIONS);
        let a = provider.embed("Successione legittima dei figli").await.unwrap();
        let b = provider.embed("Successione legittima dei figli").await.unwrap();

        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let provider = HashingEmbeddings::new(DEFAULT_DIMENSIONS);
        let query = provider.embed("forced heirship rules").await.unwrap();
        let related = provider
            .embed("Rules on forced heirship protect children")
            .await
            .unwrap();
        let unrelated = provider
            .embed("Alimony after dissolution of marriage")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = HashingEmbeddings::new(8);
        let embedding = provider.embed("").await.unwrap();
        assert_eq!(embedding, vec![0.0; 8]);
    }
}
