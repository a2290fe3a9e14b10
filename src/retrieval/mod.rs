//! Embedding index and top-k retrieval
//!
//! Similarity is cosine: higher scores are closer, ties resolve to the fact
//! inserted first.

pub mod index;
pub mod retriever;
pub mod similarity;

pub use index::FactIndex;
pub use retriever::Retriever;
pub use similarity::cosine_similarity;
