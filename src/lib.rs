//! School Assistant
//!
//! Retrieval-augmented Q&A over a small school knowledge base: facts are
//! embedded once at startup, each question retrieves the closest facts, and
//! a generative model answers from an instruction prompt grounded in them.

pub mod assistant;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod knowledge;
pub mod metrics;
pub mod prompt;
pub mod retrieval;
pub mod session;
pub mod telemetry;

pub use assistant::{Answer, SchoolAssistant};
pub use config::Config;
pub use error::{AssistantError, Result};
pub use knowledge::{school_knowledge_base, Fact, FactStore, RetrievalResult};
pub use retrieval::Retriever;
pub use session::{ConversationSession, ConversationTurn, Role};
