//! Bounded cache in front of an embedding provider

use super::{Embedder, Embedding, EmbeddingError};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use tracing::debug;

/// Memoizes embeddings by exact input text
///
/// Repeated questions are answered from memory instead of another provider
/// round trip. Cached vectors are identical to fresh ones, so ranking is
/// unaffected.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Cache<String, Embedding>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, max_entries: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Approximate number of cached entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut slots: Vec<Option<Embedding>> = Vec::with_capacity(texts.len());
        let mut misses = Vec::new();

        for text in texts {
            let cached = self.cache.get(text).await;
            if cached.is_none() {
                misses.push(text.clone());
            }
            slots.push(cached);
        }

        debug!(
            "Embedding cache: {} hits, {} misses",
            texts.len() - misses.len(),
            misses.len()
        );

        if misses.is_empty() {
            return Ok(slots.into_iter().flatten().collect());
        }

        let fresh = self.inner.embed(&misses).await?;
        if fresh.len() != misses.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                misses.len(),
                fresh.len()
            )));
        }

        for (text, vector) in misses.iter().zip(fresh.iter()) {
            self.cache.insert(text.clone(), vector.clone()).await;
        }

        let mut fresh = fresh.into_iter();
        let mut vectors = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Some(vector) => vectors.push(vector),
                None => match fresh.next() {
                    Some(vector) => vectors.push(vector),
                    None => {
                        return Err(EmbeddingError::InvalidResponse(
                            "Embedding batch ended early".to_string(),
                        ))
                    }
                },
            }
        }

        Ok(vectors)
    }
}
