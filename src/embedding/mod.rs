//! Text embedding providers
//!
//! Every index is built and queried through one [`Embedder`], so facts and
//! questions always land in the same vector space.

pub mod cache;
pub mod hashing;
pub mod http;

pub use cache::CachedEmbedder;
pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;

use async_trait::async_trait;

/// Dense embedding vector
pub type Embedding = Vec<f32>;

/// Embedding provider trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model producing the vectors
    fn model_id(&self) -> &str;

    /// Output dimensionality, when known ahead of the first call
    fn dimension(&self) -> Option<usize>;

    /// Embed a batch of texts, one vector per input in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding returned".to_string()))
    }
}

/// Embedding errors
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding API key is not configured")]
    MissingApiKey,

    #[error("Embedding request failed: {0}")]
    RequestFailed(String),

    #[error("Embedding request timed out: {0}")]
    Timeout(String),

    #[error("Embedding upstream error: {0}")]
    UpstreamError(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
