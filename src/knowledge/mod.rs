//! Knowledge base for grounded answers
//!
//! Holds the immutable fact store, the seed facts, and the retrieval
//! result types shared by the index and the prompt composer.

pub mod models;
pub mod seed;
pub mod store;

pub use models::{Fact, RetrievalResult, ScoredFact, SENTINEL_FACT};
pub use seed::{school_knowledge_base, SCHOOL_FACTS};
pub use store::FactStore;
