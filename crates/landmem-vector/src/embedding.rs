//! Embedding provider trait and mock implementation.
//!
//! The embedder turns a plot description (or a search query) into a
//! fixed-dimension vector. Every record in a deployment is embedded by the
//! same provider, so the provider's [`dimension`](EmbeddingProvider::dimension)
//! must match the store's vector width.
//!
//! # Providers
//!
//! - `MockEmbeddingProvider`: Deterministic bag-of-words vectors for testing
//! - `FastEmbedProvider`: Local embedding via fastembed (requires `embed-fastembed` feature)

use std::sync::Arc;

use async_trait::async_trait;
use landmem_core::{Error, Result};

use crate::types::EmbeddingConfig;

/// Trait for generating text embeddings.
///
/// Implementations report failures as [`Error::Embedding`] carrying the
/// offending text, so callers can tell an embedder failure from a store one.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// A mock embedding provider for testing.
///
/// Hashes each lower-cased word of the input into one of `dimension`
/// buckets and normalizes the counts. Texts that share words get a higher
/// cosine similarity than texts that don't, and every component is
/// non-negative, so similarities fall in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) as usize % self.dimension;
            embedding[bucket] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        embedding
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.bag_of_words(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.bag_of_words(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Build the embedding provider named by `config.provider`.
///
/// # Errors
///
/// Returns a configuration error for an unknown provider, or for
/// `fastembed` when the crate was built without the `embed-fastembed`
/// feature.
pub fn create_embedding_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockEmbeddingProvider::new(config.dimension))),
        #[cfg(feature = "embed-fastembed")]
        "fastembed" => Ok(Arc::new(crate::fastembed::FastEmbedProvider::new(
            &config.model,
            config.cache_path.as_deref(),
        )?)),
        #[cfg(not(feature = "embed-fastembed"))]
        "fastembed" => Err(Error::config(
            "embedding provider 'fastembed' requires the embed-fastembed feature",
        )),
        other => Err(Error::config(format!(
            "Unknown embedding provider: '{other}'. Supported: mock, fastembed"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
