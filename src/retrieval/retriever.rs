//! Query-time access to the fact index

use super::index::FactIndex;
use crate::embedding::Embedder;
use crate::error::{AssistantError, Result};
use crate::knowledge::{FactStore, RetrievalResult};
use crate::metrics::METRICS;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Top-k retriever over a shared, read-only index
///
/// A retriever without an index (empty knowledge base) answers every query
/// with an empty result instead of failing.
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Option<Arc<FactIndex>>,
    top_k: usize,
}

impl Retriever {
    pub const DEFAULT_TOP_K: usize = 2;

    pub fn new(index: Arc<FactIndex>, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(AssistantError::InvalidTopK(top_k));
        }

        Ok(Self {
            index: Some(index),
            top_k,
        })
    }

    /// Retriever for an empty knowledge base
    pub fn empty(top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(AssistantError::InvalidTopK(top_k));
        }

        Ok(Self { index: None, top_k })
    }

    /// Build the index for `store`, degrading an empty store to an empty
    /// retriever
    pub async fn bootstrap(
        store: &FactStore,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self> {
        match FactIndex::build(store, embedder).await {
            Ok(index) => Self::new(Arc::new(index), top_k),
            Err(AssistantError::EmptyStore) => {
                warn!("Knowledge base is empty; answers will not be grounded in any facts");
                Self::empty(top_k)
            }
            Err(e) => Err(e),
        }
    }

    pub fn index(&self) -> Option<&Arc<FactIndex>> {
        self.index.as_ref()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve the configured number of facts
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        self.retrieve_k(query, self.top_k).await
    }

    /// Retrieve up to `k` facts
    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(AssistantError::InvalidTopK(k));
        }

        let start = Instant::now();

        let result = match &self.index {
            Some(index) => index.retrieve(query, k).await?,
            None => {
                debug!("No index available; returning empty retrieval");
                RetrievalResult::empty()
            }
        };

        METRICS.record_retrieval(result.len(), start.elapsed().as_secs_f64());
        debug!(
            "Retrieved {} facts: {:?}",
            result.len(),
            result.ids()
        );

        Ok(result)
    }
}
