use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::services::cache::{CacheKey, EmbeddingCache};

/// Errors from the semantic similarity capability
#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("Embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Embedding provider returned error: {0}")]
    ApiError(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Cannot compare embeddings: {0}")]
    Incomparable(String),
}

/// Turns text into a dense vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier used to namespace cached vectors
    fn model(&self) -> &str;

    async fn encode(&self, text: &str) -> Result<Vec<f32>, SimilarityError>;
}

/// Semantic similarity between two strings, in [-1, 1]
///
/// Shared read-only across concurrent requests.
#[async_trait]
pub trait SemanticSimilarity: Send + Sync {
    async fn similarity(&self, lhs: &str, rhs: &str) -> Result<f32, SimilarityError>;
}

/// Cosine similarity of two vectors, clamped to [-1, 1]
///
/// Returns `None` for empty, mismatched or zero-length vectors, and when the
/// result is not finite (overflowing components).
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
    if lhs.is_empty() || lhs.len() != rhs.len() {
        return None;
    }

    let mut dot = 0.0_f32;
    let mut lhs_norm = 0.0_f32;
    let mut rhs_norm = 0.0_f32;

    for (l, r) in lhs.iter().zip(rhs.iter()) {
        dot += l * r;
        lhs_norm += l * l;
        rhs_norm += r * r;
    }

    if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
        return None;
    }

    let similarity = dot / (lhs_norm.sqrt() * rhs_norm.sqrt());
    if !similarity.is_finite() {
        return None;
    }

    Some(similarity.clamp(-1.0, 1.0))
}

/// Similarity provider backed by an embedder and a vector cache
pub struct EmbeddingSimilarity<E> {
    embedder: E,
    cache: Arc<EmbeddingCache>,
}

impl<E: Embedder> EmbeddingSimilarity<E> {
    pub fn new(embedder: E, cache: Arc<EmbeddingCache>) -> Self {
        Self { embedder, cache }
    }

    async fn embedding(&self, text: &str) -> Result<Arc<Vec<f32>>, SimilarityError> {
        let key = CacheKey::embedding(self.embedder.model(), text);

        if let Some(vector) = self.cache.get(&key).await {
            return Ok(vector);
        }

        let vector = Arc::new(self.embedder.encode(text).await?);
        self.cache.set(&key, vector.clone()).await;

        Ok(vector)
    }
}

#[async_trait]
impl<E: Embedder> SemanticSimilarity for EmbeddingSimilarity<E> {
    async fn similarity(&self, lhs: &str, rhs: &str) -> Result<f32, SimilarityError> {
        // Sequential so an identical pair is only encoded once
        let a = self.embedding(lhs).await?;
        let b = self.embedding(rhs).await?;

        cosine_similarity(&a, &b).ok_or_else(|| {
            SimilarityError::Incomparable(format!(
                "dimensions {} vs {} or zero vector",
                a.len(),
                b.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LetterEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        fn model(&self) -> &str {
            "letters"
        }

        async fn encode(&self, text: &str) -> Result<Vec<f32>, SimilarityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0_f32; 26];
            for b in text.bytes().filter(u8::is_ascii_lowercase) {
                v[(b - b'a') as usize] += 1.0;
            }
            Ok(v)
        }
    }

    #[test]
    fn test_cosine_bounds() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), Some(-1.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
    }

    #[test]
    fn test_cosine_rejects_degenerate_input() {
        assert_eq!(cosine_similarity(&[], &[]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn test_cosine_rejects_non_finite_result() {
        assert_eq!(cosine_similarity(&[1e30, 1e30], &[1e30, 1e30]), None);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), None);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), None);
    }

    #[tokio::test]
    async fn test_embedding_similarity_caches_vectors() {
        let embedder = LetterEmbedder { calls: AtomicUsize::new(0) };
        let provider = EmbeddingSimilarity::new(embedder, Arc::new(EmbeddingCache::in_memory(100, 60)));

        let first = provider.similarity("wedding", "wedding").await.unwrap();
        assert!((first - 1.0).abs() < 1e-6);

        provider.similarity("wedding", "outdoor").await.unwrap();
        // "wedding" encoded once, "outdoor" once
        assert_eq!(provider.embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_vector_is_incomparable() {
        let embedder = LetterEmbedder { calls: AtomicUsize::new(0) };
        let provider = EmbeddingSimilarity::new(embedder, Arc::new(EmbeddingCache::in_memory(100, 60)));

        let result = provider.similarity("123", "abc").await;
        assert!(matches!(result, Err(SimilarityError::Incomparable(_))));
    }
}
