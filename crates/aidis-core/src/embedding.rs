// aidis-core/src/embedding.rs
// ============================================================================
// Module: Embedding Interface
// Description: Pluggable text-to-vector interface for context search.
// Purpose: Decouple the core from any particular embedding model.
// Dependencies: async-trait, reqwest, serde
// ============================================================================

//! ## Overview
//! Context storage and search consume an [`EmbeddingProvider`]: text in,
//! fixed-width float vector out. The model itself is an external
//! collaborator; two providers ship here. [`HttpEmbeddingProvider`] calls a
//! remote service, and [`HashEmbeddingProvider`] produces deterministic
//! vectors locally for development and tests. Dimensionality is fixed per
//! provider and the search path only ever compares vectors of the configured
//! dimension.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Computed embedding for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Dense vector of the provider's fixed dimension.
    pub vector: Vec<f32>,
    /// Model label reported by the provider. The core never inspects it.
    pub model: String,
    /// Vector dimension.
    pub dimensions: usize,
}

/// Embedding computation errors.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Provider unreachable or failed.
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    /// Provider returned a vector of the wrong width.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Dimension actually returned.
        actual: usize,
    },
}

/// Maps text to a fixed-width float vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Computes the embedding for `text`.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] when the provider fails or returns a
    /// vector of the wrong dimension.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Returns the fixed vector dimension for this provider.
    fn dimensions(&self) -> usize;
}

// ============================================================================
// SECTION: Deterministic Local Provider
// ============================================================================

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words hashing embedder for development and tests.
///
/// # Invariants
/// - The same text always maps to the same unit-length vector.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    /// Fixed vector dimension.
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Creates a provider with the given dimension.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
        }
    }

    /// Hashes one token with FNV-1a.
    fn hash_token(token: &str) -> u64 {
        let mut hash = FNV_OFFSET;
        for byte in token.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let hash = Self::hash_token(token);
            let bucket = usize::try_from(hash % self.dimensions as u64)
                .map_err(|_| EmbeddingError::Unavailable("dimension overflow".to_string()))?;
            // Alternating sign keeps unrelated texts roughly orthogonal.
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(Embedding {
            vector,
            model: "local-hash".to_string(),
            dimensions: self.dimensions,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ============================================================================
// SECTION: HTTP Provider
// ============================================================================

/// Request payload sent to the remote embedding service.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    /// Text to embed.
    text: &'a str,
}

/// Response payload expected from the remote embedding service.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    /// Dense vector.
    vector: Vec<f32>,
    /// Model label.
    model: String,
}

/// Embedding provider backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    /// Embedding endpoint URL.
    endpoint: String,
    /// Fixed vector dimension the service is expected to return.
    dimensions: usize,
    /// Shared HTTP client.
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    /// Creates a provider for the given endpoint and dimension.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Unavailable`] when the HTTP client cannot
    /// be constructed.
    pub fn new(
        endpoint: impl Into<String>,
        dimensions: usize,
        request_timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| EmbeddingError::Unavailable(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            dimensions,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                text,
            })
            .send()
            .await
            .map_err(|err| EmbeddingError::Unavailable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(EmbeddingError::Unavailable(format!(
                "embedding service returned {}",
                response.status()
            )));
        }
        let payload: EmbedResponse =
            response.json().await.map_err(|err| EmbeddingError::Unavailable(err.to_string()))?;
        if payload.vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: payload.vector.len(),
            });
        }
        Ok(Embedding {
            dimensions: payload.vector.len(),
            vector: payload.vector,
            model: payload.model,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions."
    )]

    use super::Embedding;
    use super::EmbeddingProvider;
    use super::HashEmbeddingProvider;

    fn cosine(a: &Embedding, b: &Embedding) -> f32 {
        a.vector.iter().zip(&b.vector).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn hash_embeddings_are_deterministic() {
        let provider = HashEmbeddingProvider::new(64);
        let first = provider.embed("use a red-black tree").await.expect("embed");
        let second = provider.embed("use a red-black tree").await.expect("embed");
        assert_eq!(first.vector, second.vector);
        assert_eq!(first.dimensions, 64);
    }

    #[tokio::test]
    async fn hash_embeddings_are_unit_length() {
        let provider = HashEmbeddingProvider::new(64);
        let embedding = provider.embed("normalize me").await.expect("embed");
        let norm: f32 = embedding.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn identical_text_has_full_similarity() {
        let provider = HashEmbeddingProvider::new(128);
        let a = provider.embed("red-black tree rotation").await.expect("embed");
        let b = provider.embed("red-black tree rotation").await.expect("embed");
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn unrelated_text_scores_lower_than_identical() {
        let provider = HashEmbeddingProvider::new(128);
        let a = provider.embed("red-black tree rotation").await.expect("embed");
        let b = provider.embed("grocery list for tuesday").await.expect("embed");
        assert!(cosine(&a, &b) < 0.9);
    }

    #[tokio::test]
    async fn empty_text_yields_zero_vector() {
        let provider = HashEmbeddingProvider::new(32);
        let embedding = provider.embed("").await.expect("embed");
        assert!(embedding.vector.iter().all(|v| *v == 0.0));
    }
}
