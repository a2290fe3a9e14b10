//! Build-once embedding index over the fact store

use super::similarity::{cosine_with_norms, l2_norm};
use crate::embedding::{Embedder, Embedding, EmbeddingError};
use crate::error::{AssistantError, Result};
use crate::knowledge::{Fact, FactStore, RetrievalResult, ScoredFact};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

struct IndexedFact {
    fact: Fact,
    vector: Embedding,
    norm: f32,
}

/// Fact vectors computed once, scored by cosine similarity per query
///
/// The index keeps the embedder it was built with; queries are always
/// embedded by that same model.
pub struct FactIndex {
    entries: Vec<IndexedFact>,
    embedder: Arc<dyn Embedder>,
    dimension: usize,
}

impl std::fmt::Debug for FactIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactIndex")
            .field("facts", &self.entries.len())
            .field("dimension", &self.dimension)
            .field("model", &self.embedder.model_id())
            .finish()
    }
}

impl FactIndex {
    /// Embed every fact in the store
    ///
    /// Fails with [`AssistantError::EmptyStore`] when there is nothing to
    /// index.
    pub async fn build(store: &FactStore, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if store.is_empty() {
            return Err(AssistantError::EmptyStore);
        }

        let start = Instant::now();
        let texts: Vec<String> = store.iter().map(|fact| fact.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "Expected {} fact embeddings, got {}",
                texts.len(),
                vectors.len()
            ))
            .into());
        }

        let dimension = match embedder.dimension() {
            Some(dimension) => dimension,
            None => vectors.first().map(Vec::len).unwrap_or_default(),
        };

        if dimension == 0 {
            return Err(EmbeddingError::InvalidResponse(
                "Embedding provider returned zero-length vectors".to_string(),
            )
            .into());
        }

        let mut entries = Vec::with_capacity(vectors.len());
        for (fact, vector) in store.iter().zip(vectors) {
            if vector.len() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                }
                .into());
            }

            entries.push(IndexedFact {
                fact: fact.clone(),
                norm: l2_norm(&vector),
                vector,
            });
        }

        info!(
            "Fact index built: {} facts, dimension {}, model {}, {:?}",
            entries.len(),
            dimension,
            embedder.model_id(),
            start.elapsed()
        );

        Ok(Self {
            entries,
            embedder,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Indexed facts in insertion order
    pub fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.entries.iter().map(|entry| &entry.fact)
    }

    /// Top-k facts for a free-text query
    ///
    /// `k` larger than the index returns every fact.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(AssistantError::InvalidTopK(k));
        }

        let query_vector = self.embedder.embed_one(query).await?;
        self.search(&query_vector, k)
    }

    /// Top-k facts for an already embedded query
    ///
    /// Ranked by descending cosine similarity; equal scores keep insertion
    /// order.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(AssistantError::InvalidTopK(k));
        }

        if query_vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query_vector.len(),
            }
            .into());
        }

        let query_norm = l2_norm(query_vector);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let score = cosine_with_norms(query_vector, query_norm, &entry.vector, entry.norm);
                (position, score)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        let hits: Vec<ScoredFact> = scored
            .into_iter()
            .map(|(position, score)| ScoredFact {
                fact: self.entries[position].fact.clone(),
                score,
            })
            .collect();

        debug!(
            "Search returned {} of {} facts (k={})",
            hits.len(),
            self.entries.len(),
            k
        );

        Ok(RetrievalResult { hits })
    }
}
