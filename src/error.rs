//! Error types for the assistant pipeline

use crate::embedding::EmbeddingError;
use crate::generation::GenerationError;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Errors raised below the per-turn boundary
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The knowledge base had no facts when the index was built
    #[error("Knowledge base is empty: cannot build an index over zero facts")]
    EmptyStore,

    #[error("Invalid fact: {0}")]
    InvalidFact(String),

    #[error("Duplicate fact id: {0}")]
    DuplicateFactId(String),

    #[error("Top-k must be at least 1, got {0}")]
    InvalidTopK(usize),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for AssistantError {
    fn from(err: config::ConfigError) -> Self {
        AssistantError::Config(err.to_string())
    }
}

impl AssistantError {
    /// Whether the error came from an external provider call
    pub fn is_upstream(&self) -> bool {
        matches!(self, AssistantError::Embedding(_) | AssistantError::Generation(_))
    }
}
