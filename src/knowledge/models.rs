//! Data models for the knowledge base

use serde::{Deserialize, Serialize};

/// Fallback line used when retrieval finds nothing to ground the answer on
pub const SENTINEL_FACT: &str = "No specific information found.";

/// A short natural-language statement with a stable identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub text: String,
}

impl Fact {
    /// Create a new fact, rejecting blank ids or text
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> crate::error::Result<Self> {
        let id = id.into();
        let text = text.into();

        if id.trim().is_empty() {
            return Err(crate::error::AssistantError::InvalidFact(
                "Fact id cannot be empty".to_string(),
            ));
        }

        if text.trim().is_empty() {
            return Err(crate::error::AssistantError::InvalidFact(format!(
                "Fact {} has empty text",
                id
            )));
        }

        Ok(Self { id, text })
    }

    /// Compute hash of the normalized text for duplicate detection
    ///
    /// Case and runs of whitespace are ignored, so "Gym opens at 4 PM" and
    /// "gym  opens at 4 pm" hash the same.
    pub fn content_hash(&self) -> String {
        use sha2::{Digest, Sha256};

        let normalized = self
            .text
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A fact paired with its similarity to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFact {
    pub fact: Fact,
    /// Cosine similarity in [-1.0, 1.0], higher is closer
    pub score: f32,
}

/// Top-k facts for a query, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredFact>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Fact texts in rank order
    pub fn texts(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.fact.text.as_str()).collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.fact.id.as_str()).collect()
    }

    pub fn top(&self) -> Option<&ScoredFact> {
        self.hits.first()
    }
}
