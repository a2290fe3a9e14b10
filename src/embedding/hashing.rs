//! Deterministic feature-hashing embedder
//!
//! Each text is reduced to content words (lowercased ASCII alphanumeric runs
//! of at least two characters, stopwords removed). Every word contributes
//! itself plus its boundary-marked character trigrams (`<word>` windows) as
//! features. A feature lands in bucket `h % dimension` with sign taken from
//! the top bit of `h`, where `h` is the first 8 bytes (little endian) of
//! SHA-256 over the feature string. Trigram features are prefixed with `#`
//! so they never collide with a two-letter word. The result is L2
//! normalized; a text with no content words maps to the zero vector.

use super::{Embedder, Embedding, EmbeddingError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 1.0;
const MIN_TOKEN_LEN: usize = 2;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are",
        "as", "at", "be", "been", "before", "being", "below", "between", "both", "but", "by",
        "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
        "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
        "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most",
        "my", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "our", "out",
        "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
        "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
        "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
        "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Offline embedder with no model download and fully reproducible output
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 1024;

    /// Create an embedder with the given number of buckets (minimum 1)
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("hashing-trigram-{}", dimension),
        }
    }

    /// Embed one text synchronously
    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            self.add_feature(&mut vector, &[token.as_bytes()], WORD_WEIGHT);

            let marked = format!("<{}>", token);
            for gram in marked.as_bytes().windows(3) {
                self.add_feature(&mut vector, &[b"#".as_slice(), gram], TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }

        vector
    }

    fn add_feature(&self, vector: &mut [f32], parts: &[&[u8]], weight: f32) {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let h = u64::from_le_bytes(head);

        let bucket = (h % self.dimension as u64) as usize;
        let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

/// Split text into lowercase content words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() >= MIN_TOKEN_LEN && !STOPWORDS.contains(*token))
        .map(String::from)
        .collect()
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
